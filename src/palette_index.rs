use crate::color::{distance_squared, Color};
use crate::error::PaletteError;
use crate::palette::Palette;
use image::{imageops::ColorMap, Rgb};

/// Palettes up to this size are searched linearly.
const LINEAR_SCAN_LIMIT: usize = 32;

/// Search key: distance first, then palette position for the leftmost tie-break.
type Key = (u32, usize);

#[derive(Debug)]
struct Node {
    color: Color,
    position: usize,
    axis: usize,
    left: Option<u32>,
    right: Option<u32>,
}

#[derive(Debug, Default)]
struct Pool {
    nodes: Vec<Node>,
}

impl Pool {
    fn create(&mut self, color: Color, position: usize, axis: usize) -> u32 {
        let id = self.nodes.len();
        self.nodes.push(Node {
            color,
            position,
            axis,
            left: None,
            right: None,
        });
        id as u32
    }

    #[inline(always)]
    fn get(&self, id: u32) -> &Node {
        &self.nodes[id as usize]
    }

    fn get_mut(&mut self, id: u32) -> &mut Node {
        &mut self.nodes[id as usize]
    }
}

fn widest_axis(entries: &[(Color, usize)]) -> usize {
    (0..3)
        .map(|axis| {
            let values = entries.iter().map(|(c, _)| c.channel(axis));
            let min = values.clone().min().unwrap_or(u8::MIN);
            let max = values.max().unwrap_or(u8::MAX);
            (max - min, axis)
        })
        // widest spread, lowest axis on equal spread
        .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
        .map_or(0, |(_, axis)| axis)
}

/// Balanced k-d tree over palette colors, split at the median of the widest
/// axis.
#[derive(Debug)]
struct KdTree {
    pool: Pool,
    root: u32,
}

impl KdTree {
    fn build(colors: &[Color]) -> Self {
        let mut entries: Vec<(Color, usize)> =
            colors.iter().copied().enumerate().map(|(i, c)| (c, i)).collect();
        let mut pool = Pool::default();
        let root = Self::build_node(&mut pool, &mut entries).unwrap_or_default();
        Self { pool, root }
    }

    fn build_node(pool: &mut Pool, entries: &mut [(Color, usize)]) -> Option<u32> {
        if entries.is_empty() {
            return None;
        }
        let axis = widest_axis(entries);
        entries.sort_unstable_by_key(|&(c, i)| (c.channel(axis), i));
        let mid = entries.len() / 2;
        let (color, position) = entries[mid];
        let node_id = pool.create(color, position, axis);
        let (left, rest) = entries.split_at_mut(mid);
        let left = Self::build_node(pool, left);
        let right = Self::build_node(pool, &mut rest[1..]);
        let node = pool.get_mut(node_id);
        node.left = left;
        node.right = right;
        Some(node_id)
    }

    fn nearest(&self, color: Color) -> usize {
        let mut best: Key = (u32::MAX, usize::MAX);
        self.search(self.root, color, &mut best);
        best.1
    }

    fn search(&self, node_id: u32, color: Color, best: &mut Key) {
        let node = self.pool.get(node_id);
        let key = (distance_squared(node.color, color), node.position);
        if key < *best {
            *best = key;
        }
        let diff = color.channel(node.axis) as i32 - node.color.channel(node.axis) as i32;
        let (near, far) = if diff < 0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(near_id) = near {
            self.search(near_id, color, best);
        }
        // An equidistant color behind the plane may still have a lower position,
        // so only a strictly farther plane is pruned.
        if let Some(far_id) = far {
            if (diff * diff) as u32 <= best.0 {
                self.search(far_id, color, best);
            }
        }
    }
}

#[derive(Debug)]
enum Strategy {
    Linear,
    Tree(KdTree),
}

/// Nearest-color lookup over a fixed palette.
///
/// Answers the palette color closest to a query in Euclidean RGB distance.
/// Equidistant candidates resolve to the one that comes first in the
/// palette, whichever search strategy is in use.
#[derive(Debug)]
pub struct PaletteIndex {
    colors: Vec<Color>,
    strategy: Strategy,
}

impl PaletteIndex {
    /// Picks a linear scan for small palettes and a k-d tree otherwise.
    pub fn build(palette: &Palette) -> Self {
        if palette.len() <= LINEAR_SCAN_LIMIT {
            Self::linear(palette)
        } else {
            Self::tree(palette)
        }
    }

    pub fn from_colors(colors: &[Color]) -> Result<Self, PaletteError> {
        Ok(Self::build(&Palette::new(colors.to_vec())?))
    }

    pub fn linear(palette: &Palette) -> Self {
        Self {
            colors: palette.colors().to_vec(),
            strategy: Strategy::Linear,
        }
    }

    pub fn tree(palette: &Palette) -> Self {
        Self {
            colors: palette.colors().to_vec(),
            strategy: Strategy::Tree(KdTree::build(palette.colors())),
        }
    }

    #[inline(always)]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Position of the nearest palette color.
    pub fn nearest_index(&self, color: Color) -> usize {
        match &self.strategy {
            Strategy::Linear => self
                .colors
                .iter()
                .enumerate()
                .min_by_key(|(_, &c)| distance_squared(c, color))
                .map_or(0, |(i, _)| i),
            Strategy::Tree(tree) => tree.nearest(color),
        }
    }

    #[inline(always)]
    pub fn nearest(&self, color: Color) -> Color {
        self.colors[self.nearest_index(color)]
    }
}

impl ColorMap for PaletteIndex {
    type Color = Rgb<u8>;

    #[inline(always)]
    fn index_of(&self, color: &Self::Color) -> usize {
        self.nearest_index((*color).into())
    }

    fn lookup(&self, index: usize) -> Option<Self::Color> {
        self.colors.get(index).copied().map(Rgb::from)
    }

    fn has_lookup(&self) -> bool {
        true
    }

    #[inline(always)]
    fn map_color(&self, color: &mut Self::Color) {
        *color = self.nearest((*color).into()).into()
    }
}
