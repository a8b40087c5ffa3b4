#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

use helix_forge::{
    Atom, BaseLetter, Chain, Element, Frame, Point, Residue, ResidueCategory, Structure, templates,
};
use nalgebra::{Rotation3, Vector3};

pub const RISE: f64 = 3.38;
pub const TWIST: f64 = 36.0;

/// Strand and pair index of a duplex residue.
pub type Site = (u8, usize);
pub const FORWARD: u8 = 0;
pub const REVERSE: u8 = 1;

pub fn residue_name(letter: BaseLetter) -> &'static str {
    match letter {
        BaseLetter::A => "DA",
        BaseLetter::C => "DC",
        BaseLetter::G => "DG",
        BaseLetter::T => "DT",
        BaseLetter::U => "U",
        BaseLetter::I => "DI",
    }
}

pub fn complement(letter: BaseLetter) -> BaseLetter {
    match letter {
        BaseLetter::A => BaseLetter::T,
        BaseLetter::T | BaseLetter::U => BaseLetter::A,
        BaseLetter::G => BaseLetter::C,
        BaseLetter::C | BaseLetter::I => BaseLetter::G,
    }
}

/// Template base placed through `frame`.
pub fn base(letter: BaseLetter, id: i32, frame: &Frame) -> Residue {
    let template = templates::get(letter).expect("template for every parent base");
    let mut residue = Residue::new(id, None, residue_name(letter), ResidueCategory::Polymer);
    for (name, element, pos) in template.atoms() {
        residue.add_atom(Atom::new(name, element, frame.to_world(&pos)));
    }
    residue
}

pub fn single_chain(residues: Vec<Residue>) -> Structure {
    let mut chain = Chain::new("A");
    for residue in residues {
        chain.add_residue(residue);
    }
    let mut structure = Structure::new();
    structure.add_chain(chain);
    structure
}

/// Ideal duplex with 3.38 Å rise and 36° twist.
///
/// Chain A carries the given sequence; chain B carries the complement written 5'→3'.
/// O3'→P backbone links are drawn as atom pairs placed well away from the bases.
///
/// Integration tests cannot see the crate's `#[cfg(test)]` helpers, so this is the only
/// duplex builder and every duplex-driven test lives under `tests/`.
pub struct Duplex {
    sequence: Vec<BaseLetter>,
    heights: Vec<f64>,
    links: BTreeSet<(Site, Site)>,
}

impl Duplex {
    pub fn new(sequence: &str) -> Self {
        let sequence: Vec<BaseLetter> = sequence
            .chars()
            .map(|c| c.to_string().parse().expect("base letter"))
            .collect();
        let n = sequence.len();
        let links = (1..n)
            .flat_map(|k| {
                [
                    ((FORWARD, k - 1), (FORWARD, k)),
                    ((REVERSE, k), (REVERSE, k - 1)),
                ]
            })
            .collect();
        Self {
            heights: (0..n).map(|k| RISE * k as f64).collect(),
            sequence,
            links,
        }
    }

    /// Flips the forward-strand link between pairs `k` and `k + 1`.
    pub fn reverse_link(mut self, k: usize) -> Self {
        self.links.remove(&((FORWARD, k), (FORWARD, k + 1)));
        self.links.insert(((FORWARD, k + 1), (FORWARD, k)));
        self
    }

    /// Drops the reverse-strand link between pairs `k + 1` and `k`.
    pub fn cut_reverse_link(mut self, k: usize) -> Self {
        self.links.remove(&((REVERSE, k + 1), (REVERSE, k)));
        self
    }

    pub fn without_links(mut self) -> Self {
        self.links.clear();
        self
    }

    /// Removes both links between pairs `k` and `k + 1` and lifts the upper pairs by `gap`.
    pub fn break_after(mut self, k: usize, gap: f64) -> Self {
        self.links
            .retain(|&((_, a), (_, b))| (a.min(b), a.max(b)) != (k, k + 1));
        for height in self.heights.iter_mut().skip(k + 1) {
            *height += gap;
        }
        self
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn frame(&self, k: usize) -> Frame {
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), (TWIST * k as f64).to_radians());
        Frame::new(Point::new(0.0, 0.0, self.heights[k]), *rotation.matrix(), 0.0)
    }

    pub fn build(&self) -> Structure {
        let n = self.len();
        let mut strands: [Vec<Residue>; 2] = [
            (0..n)
                .map(|k| base(self.sequence[k], k as i32 + 1, &self.frame(k)))
                .collect(),
            (0..n)
                .map(|k| {
                    base(
                        complement(self.sequence[k]),
                        (2 * n - k) as i32,
                        &self.frame(k).flipped(),
                    )
                })
                .collect(),
        ];

        for ((strand, k), name, element, pos) in self.link_atoms() {
            strands[strand as usize][k].add_atom(Atom::new(name, element, pos));
        }

        let [forward, reverse] = strands;
        let mut chain_a = Chain::new("A");
        forward.into_iter().for_each(|r| chain_a.add_residue(r));
        let mut chain_b = Chain::new("B");
        reverse.into_iter().rev().for_each(|r| chain_b.add_residue(r));

        let mut structure = Structure::new();
        structure.add_chain(chain_a);
        structure.add_chain(chain_b);
        structure
    }

    /// Places each connected O3'/P path on its own line with 1.6 Å spacing.
    fn link_atoms(&self) -> Vec<(Site, &'static str, Element, Point)> {
        // `true` marks an O3' node, `false` a P node.
        let mut adjacency: BTreeMap<(Site, bool), Vec<(Site, bool)>> = BTreeMap::new();
        for &(from, to) in &self.links {
            adjacency.entry((from, true)).or_default().push((to, false));
            adjacency.entry((to, false)).or_default().push((from, true));
        }

        let mut visited = BTreeSet::new();
        let mut atoms = Vec::new();
        let mut line = 0.0;
        let ends: Vec<(Site, bool)> = adjacency
            .iter()
            .filter(|(_, next)| next.len() == 1)
            .map(|(node, _)| *node)
            .collect();

        for start in ends {
            if visited.contains(&start) {
                continue;
            }
            let mut node = Some(start);
            let mut x = 0.0;
            while let Some(current) = node {
                visited.insert(current);
                let pos = Point::new(400.0 + x, 400.0 + line, 400.0);
                let (name, element) = if current.1 { ("O3'", Element::O) } else { ("P", Element::P) };
                atoms.push((current.0, name, element, pos));
                node = adjacency[&current]
                    .iter()
                    .copied()
                    .find(|next| !visited.contains(next));
                x += 1.6;
            }
            line += 30.0;
        }
        atoms
    }
}
