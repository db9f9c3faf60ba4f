//! Sparse 8-connected adjacency graph over all non-background pixels.
//!
//! Nodes live in an arena indexed by [`NodeId`]; a same-dimension grid of
//! optional ids gives random access by coordinate. Neighbor slots hold ids,
//! never owning references, so linkage is cheap index copies.

use imageproc::point::Point;
use log::debug;

use crate::classify::{ClassificationMap, PixelClass};

/// Index of a node in the graph's arena.
pub type NodeId = u32;

/// The eight compass directions, in neighbor-slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    /// The `(dx, dy)` coordinate offset of this direction. Positive y points
    /// down, matching raster scan order.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
            Direction::NorthEast => (1, -1),
            Direction::NorthWest => (-1, -1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (-1, 1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::NorthEast => Direction::SouthWest,
            Direction::NorthWest => Direction::SouthEast,
            Direction::SouthEast => Direction::NorthWest,
            Direction::SouthWest => Direction::NorthEast,
        }
    }

    fn slot(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
            Direction::NorthEast => 4,
            Direction::NorthWest => 5,
            Direction::SouthEast => 6,
            Direction::SouthWest => 7,
        }
    }
}

/// One non-background pixel: its classification, coordinate, and up to eight
/// neighbor ids. Nodes never own their neighbors; the graph owns all nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelNode {
    class: PixelClass,
    position: Point<u32>,
    neighbors: [Option<NodeId>; 8],
}

impl PixelNode {
    pub fn class(&self) -> PixelClass {
        self.class
    }

    pub fn position(&self) -> Point<u32> {
        self.position
    }

    /// The neighbor id in the given direction, absent when the target
    /// coordinate is out of bounds or background.
    pub fn neighbor(&self, direction: Direction) -> Option<NodeId> {
        self.neighbors[direction.slot()]
    }

    /// Present neighbors, paired with their directions.
    pub fn neighbors(&self) -> impl Iterator<Item = (Direction, NodeId)> + '_ {
        Direction::ALL
            .iter()
            .filter_map(|d| self.neighbors[d.slot()].map(|id| (*d, id)))
    }
}

/// The complete pixel adjacency graph for one classification map.
///
/// Built once via [`PixelGraph::build`]; never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGraph {
    width: u32,
    height: u32,
    nodes: Vec<PixelNode>,
    grid: Vec<Option<NodeId>>,
}

impl PixelGraph {
    /// Builds the graph from a finished classification map in two phases.
    ///
    /// The node phase allocates one node per non-background coordinate with
    /// all neighbor slots absent; the link phase then resolves every slot
    /// against the completed grid. The phase split is a data dependency, not
    /// style: linking may only start once every node exists, otherwise nodes
    /// early in scan order would miss neighbors allocated after them.
    pub fn build(map: &ClassificationMap) -> PixelGraph {
        let (width, height) = map.dimensions();
        let mut nodes = Vec::new();
        let mut grid = vec![None; (width as usize) * (height as usize)];

        // Node phase.
        for y in 0..height {
            for x in 0..width {
                let class = map.get(x, y).unwrap_or(PixelClass::Background);
                if class == PixelClass::Background {
                    continue;
                }
                let id = nodes.len() as NodeId;
                nodes.push(PixelNode {
                    class,
                    position: Point::new(x, y),
                    neighbors: [None; 8],
                });
                grid[(y as usize) * (width as usize) + (x as usize)] = Some(id);
            }
        }

        // Link phase: every node now exists, so lookups see the full grid.
        for id in 0..nodes.len() {
            let Point { x, y } = nodes[id].position;
            for direction in Direction::ALL {
                let (dx, dy) = direction.offset();
                let nx = x as i64 + dx as i64;
                let ny = y as i64 + dy as i64;
                if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                    continue;
                }
                nodes[id].neighbors[direction.slot()] =
                    grid[(ny as usize) * (width as usize) + (nx as usize)];
            }
        }

        debug!("pixel graph: {} node(s) over {width}x{height}", nodes.len());
        PixelGraph {
            width,
            height,
            nodes,
            grid,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The node at a coordinate, absent if background or out of bounds.
    pub fn node_at(&self, x: u32, y: u32) -> Option<&PixelNode> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.grid[(y as usize) * (self.width as usize) + (x as usize)]
            .map(|id| &self.nodes[id as usize])
    }

    pub fn node(&self, id: NodeId) -> Option<&PixelNode> {
        self.nodes.get(id as usize)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &PixelNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (i as NodeId, n))
    }
}
