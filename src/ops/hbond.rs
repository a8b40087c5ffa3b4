//! Capacity-limited hydrogen-bond assignment between two residues.
//!
//! Every polar heavy atom receives a number of donor and acceptor slots from a capacity table
//! keyed by element, hybridization, and attached hydrogens. Planar (sp2) atoms orient their
//! slots in the base plane: two slots sit ±60° off the exocyclic bond of an amine or carbonyl,
//! and a ring nitrogen has one slot along the external bisector. Candidate contacts are
//! committed greedily from the shortest distance up; a contact is kept only while both atoms
//! still have a free slot aligned with the contact direction.
//!
//! Assignment reads atom coordinates only. Base templates supply the polar atom table for
//! nucleotides; residues without a template fall back to treating every nitrogen and oxygen
//! as an isotropic site.

use super::config::{GEOMETRY_EPSILON, PairingConfig};
use crate::db::{self, TemplateView};
use crate::model::residue::Residue;
use crate::model::types::{BaseLetter, Element, Hybridization, Point};
use nalgebra::{Rotation3, Unit, Vector3};
use serde::Serialize;
use smol_str::SmolStr;
use std::collections::BTreeSet;

/// Two heavy atoms closer than this are considered covalently bonded.
const COVALENT_CUTOFF: f64 = 1.9;

/// Angular offset of the two in-plane slots of an amine or carbonyl from the exocyclic bond.
const TRIGONAL_SLOT_OFFSET: f64 = 60.0;

/// Sugar hydroxyl used by the fallback validity criterion.
const SUGAR_HYDROXYL: &str = "O2'";

/// Maximum simultaneous donor and acceptor roles of one atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capacity {
    pub donors: u8,
    pub acceptors: u8,
}

struct CapacityEntry {
    element: Element,
    hybridization: Hybridization,
    hydrogens: u8,
    capacity: Capacity,
}

const CAPACITY_TABLE: [CapacityEntry; 6] = [
    // Amine nitrogen (A N6, C N4, G N2).
    CapacityEntry {
        element: Element::N,
        hybridization: Hybridization::Sp2,
        hydrogens: 2,
        capacity: Capacity {
            donors: 2,
            acceptors: 0,
        },
    },
    // Imino nitrogen (G N1, U/T N3).
    CapacityEntry {
        element: Element::N,
        hybridization: Hybridization::Sp2,
        hydrogens: 1,
        capacity: Capacity {
            donors: 1,
            acceptors: 0,
        },
    },
    // Aromatic ring nitrogen with a lone pair (A N1, N3, N7; C N3).
    CapacityEntry {
        element: Element::N,
        hybridization: Hybridization::Sp2,
        hydrogens: 0,
        capacity: Capacity {
            donors: 0,
            acceptors: 1,
        },
    },
    // Carbonyl oxygen.
    CapacityEntry {
        element: Element::O,
        hybridization: Hybridization::Sp2,
        hydrogens: 0,
        capacity: Capacity {
            donors: 0,
            acceptors: 2,
        },
    },
    // Hydroxyl oxygen.
    CapacityEntry {
        element: Element::O,
        hybridization: Hybridization::Sp3,
        hydrogens: 1,
        capacity: Capacity {
            donors: 1,
            acceptors: 2,
        },
    },
    // Ether oxygen.
    CapacityEntry {
        element: Element::O,
        hybridization: Hybridization::Sp3,
        hydrogens: 0,
        capacity: Capacity {
            donors: 0,
            acceptors: 2,
        },
    },
];

const GENERIC_NITROGEN: Capacity = Capacity {
    donors: 1,
    acceptors: 1,
};

const GENERIC_OXYGEN: Capacity = Capacity {
    donors: 1,
    acceptors: 2,
};

/// Looks up the slot capacity for a typed polar atom.
///
/// # Returns
///
/// `Some(Capacity)` for combinations listed in the capacity table, otherwise `None`.
pub fn capacity(element: Element, hybridization: Hybridization, hydrogens: u8) -> Option<Capacity> {
    CAPACITY_TABLE
        .iter()
        .find(|e| {
            e.element == element && e.hybridization == hybridization && e.hydrogens == hydrogens
        })
        .map(|e| e.capacity)
}

fn generic_capacity(element: Element) -> Option<Capacity> {
    match element {
        Element::N => Some(GENERIC_NITROGEN),
        Element::O => Some(GENERIC_OXYGEN),
        _ => None,
    }
}

/// Canonical donor/acceptor atom pairs, keyed by (donor base, acceptor base).
const CANONICAL_BONDS: [(BaseLetter, BaseLetter, &str, &str); 11] = [
    (BaseLetter::A, BaseLetter::T, "N6", "O4"),
    (BaseLetter::T, BaseLetter::A, "N3", "N1"),
    (BaseLetter::A, BaseLetter::U, "N6", "O4"),
    (BaseLetter::U, BaseLetter::A, "N3", "N1"),
    (BaseLetter::C, BaseLetter::G, "N4", "O6"),
    (BaseLetter::G, BaseLetter::C, "N1", "N3"),
    (BaseLetter::G, BaseLetter::C, "N2", "O2"),
    (BaseLetter::G, BaseLetter::U, "N1", "O2"),
    (BaseLetter::U, BaseLetter::G, "N3", "O6"),
    (BaseLetter::G, BaseLetter::T, "N1", "O2"),
    (BaseLetter::T, BaseLetter::G, "N3", "O6"),
];

fn is_canonical(donor: BaseLetter, acceptor: BaseLetter, donor_atom: &str, acceptor_atom: &str) -> bool {
    CANONICAL_BONDS
        .iter()
        .any(|&(d, a, dn, an)| d == donor && a == acceptor && dn == donor_atom && an == acceptor_atom)
}

/// Which residue of the analyzed pair an atom belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PairSide {
    First,
    Second,
}

/// An atom taking part in a hydrogen bond.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BondAtom {
    pub side: PairSide,
    pub name: SmolStr,
    /// Index of the atom in its residue's atom list.
    pub index: usize,
}

/// A committed donor–acceptor contact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HydrogenBond {
    pub donor: BondAtom,
    pub acceptor: BondAtom,
    pub distance: f64,
    /// `true` when the atom pair belongs to the canonical table for the two bases.
    pub standard: bool,
}

/// Why a geometrically admissible contact was not committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// Every donor slot of the donor atom is already used.
    DonorSaturated,
    /// Every acceptor slot of the acceptor atom is already used.
    AcceptorSaturated,
    /// Free slots remain but none points along the contact.
    NoAlignedSlot,
    /// The same two atoms are already bonded in the opposite direction.
    AtomPairBonded,
}

/// A contact that passed the distance window but was not committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedContact {
    pub donor: BondAtom,
    pub acceptor: BondAtom,
    pub distance: f64,
    pub reason: RejectReason,
}

/// Full outcome of one assignment run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BondAssignment {
    pub bonds: Vec<HydrogenBond>,
    pub rejected: Vec<RejectedContact>,
    /// An O2' of one residue lies within bonding distance of a polar atom of the other.
    pub sugar_contact: bool,
}

impl BondAssignment {
    /// Hydrogen-bond validity gate: enough committed bonds, or a sugar-hydroxyl contact.
    pub fn is_valid(&self, min_hbonds: usize) -> bool {
        self.bonds.len() >= min_hbonds || self.sugar_contact
    }

    /// Number of committed bonds involving the given atom, in any role.
    pub fn bonds_at(&self, side: PairSide, index: usize) -> usize {
        self.bonds
            .iter()
            .filter(|b| {
                (b.donor.side == side && b.donor.index == index)
                    || (b.acceptor.side == side && b.acceptor.index == index)
            })
            .count()
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Directed(Vector3<f64>),
    Isotropic,
}

#[derive(Debug, Clone)]
struct Site {
    side: PairSide,
    index: usize,
    name: SmolStr,
    pos: Point,
    donor_slots: Vec<Slot>,
    acceptor_slots: Vec<Slot>,
}

impl Site {
    fn bond_atom(&self) -> BondAtom {
        BondAtom {
            side: self.side,
            name: self.name.clone(),
            index: self.index,
        }
    }
}

struct Contact {
    donor: usize,
    acceptor: usize,
    distance: f64,
}

/// Finds and commits a capacity-respecting set of hydrogen bonds between two residues.
#[derive(Debug, Clone, Copy)]
pub struct HydrogenBondAssigner<'c> {
    config: &'c PairingConfig,
}

impl<'c> HydrogenBondAssigner<'c> {
    pub fn new(config: &'c PairingConfig) -> Self {
        Self { config }
    }

    /// Returns the committed bonds between two residues.
    ///
    /// Templates are resolved from the residue names through the registry.
    pub fn assign(&self, first: &Residue, second: &Residue) -> Vec<HydrogenBond> {
        self.resolve(first, second).bonds
    }

    /// Runs the assignment and reports committed bonds, rejected contacts, and the sugar
    /// contact flag.
    pub fn resolve(&self, first: &Residue, second: &Residue) -> BondAssignment {
        self.resolve_with_templates(
            first,
            template_for(first),
            second,
            template_for(second),
        )
    }

    /// Runs the assignment with explicitly chosen templates.
    ///
    /// The pair selector passes the templates chosen during frame fitting, so residues
    /// identified by atom-based detection use the same polar atom table as registered ones.
    ///
    /// # Arguments
    ///
    /// * `first` / `second` - Residues to pair.
    /// * `first_template` / `second_template` - Base templates, or `None` for generic typing.
    pub fn resolve_with_templates(
        &self,
        first: &Residue,
        first_template: Option<TemplateView<'_>>,
        second: &Residue,
        second_template: Option<TemplateView<'_>>,
    ) -> BondAssignment {
        let mut sites = polar_sites(first, first_template, PairSide::First);
        let split = sites.len();
        sites.extend(polar_sites(second, second_template, PairSide::Second));

        let contacts = self.enumerate_contacts(&sites, split);

        let mut used_donor: Vec<Vec<bool>> =
            sites.iter().map(|s| vec![false; s.donor_slots.len()]).collect();
        let mut used_acceptor: Vec<Vec<bool>> = sites
            .iter()
            .map(|s| vec![false; s.acceptor_slots.len()])
            .collect();
        let mut bonded: BTreeSet<(usize, usize)> = BTreeSet::new();
        let min_cos = (self.config.slot_tolerance.to_radians()).cos() - GEOMETRY_EPSILON;

        let letters = (
            first_template.map(|t| t.letter()),
            second_template.map(|t| t.letter()),
        );

        let mut assignment = BondAssignment::default();

        for contact in contacts {
            let donor = &sites[contact.donor];
            let acceptor = &sites[contact.acceptor];
            let key = (
                contact.donor.min(contact.acceptor),
                contact.donor.max(contact.acceptor),
            );
            let direction = (acceptor.pos - donor.pos) / contact.distance;

            let outcome = if bonded.contains(&key) {
                Err(RejectReason::AtomPairBonded)
            } else {
                pick_slot(&donor.donor_slots, &used_donor[contact.donor], &direction, min_cos)
                    .map_err(|full| {
                        if full {
                            RejectReason::DonorSaturated
                        } else {
                            RejectReason::NoAlignedSlot
                        }
                    })
                    .and_then(|donor_slot| {
                        pick_slot(
                            &acceptor.acceptor_slots,
                            &used_acceptor[contact.acceptor],
                            &(-direction),
                            min_cos,
                        )
                        .map(|acceptor_slot| (donor_slot, acceptor_slot))
                        .map_err(|full| {
                            if full {
                                RejectReason::AcceptorSaturated
                            } else {
                                RejectReason::NoAlignedSlot
                            }
                        })
                    })
            };

            match outcome {
                Ok((donor_slot, acceptor_slot)) => {
                    used_donor[contact.donor][donor_slot] = true;
                    used_acceptor[contact.acceptor][acceptor_slot] = true;
                    bonded.insert(key);

                    let standard = match (side_letter(letters, donor.side), side_letter(letters, acceptor.side)) {
                        (Some(d), Some(a)) => is_canonical(d, a, &donor.name, &acceptor.name),
                        _ => false,
                    };
                    assignment.bonds.push(HydrogenBond {
                        donor: donor.bond_atom(),
                        acceptor: acceptor.bond_atom(),
                        distance: contact.distance,
                        standard,
                    });
                }
                Err(reason) => {
                    log::trace!(
                        "rejected {}-{} contact at {:.2} Å: {:?}",
                        donor.name,
                        acceptor.name,
                        contact.distance,
                        reason
                    );
                    assignment.rejected.push(RejectedContact {
                        donor: donor.bond_atom(),
                        acceptor: acceptor.bond_atom(),
                        distance: contact.distance,
                        reason,
                    });
                }
            }
        }

        assignment.sugar_contact = self.sugar_contact(first, &sites[split..])
            || self.sugar_contact(second, &sites[..split]);

        assignment
    }

    /// Donor→acceptor contacts within the distance window, shortest first.
    fn enumerate_contacts(&self, sites: &[Site], split: usize) -> Vec<Contact> {
        let mut contacts = Vec::new();
        for a in 0..split {
            for b in split..sites.len() {
                let distance = nalgebra::distance(&sites[a].pos, &sites[b].pos);
                if !PairingConfig::within(
                    distance,
                    self.config.hb_min_distance,
                    self.config.hb_max_distance,
                ) {
                    continue;
                }
                if !sites[a].donor_slots.is_empty() && !sites[b].acceptor_slots.is_empty() {
                    contacts.push(Contact {
                        donor: a,
                        acceptor: b,
                        distance,
                    });
                }
                if !sites[b].donor_slots.is_empty() && !sites[a].acceptor_slots.is_empty() {
                    contacts.push(Contact {
                        donor: b,
                        acceptor: a,
                        distance,
                    });
                }
            }
        }

        contacts.sort_by(|x, y| {
            x.distance
                .total_cmp(&y.distance)
                .then_with(|| sites[x.donor].side.cmp(&sites[y.donor].side))
                .then_with(|| sites[x.donor].index.cmp(&sites[y.donor].index))
                .then_with(|| sites[x.acceptor].side.cmp(&sites[y.acceptor].side))
                .then_with(|| sites[x.acceptor].index.cmp(&sites[y.acceptor].index))
        });
        contacts
    }

    fn sugar_contact(&self, residue: &Residue, partner_sites: &[Site]) -> bool {
        let Some(hydroxyl) = residue.atom(SUGAR_HYDROXYL) else {
            return false;
        };
        partner_sites.iter().any(|site| {
            PairingConfig::within(
                nalgebra::distance(&hydroxyl.pos, &site.pos),
                self.config.hb_min_distance,
                self.config.hb_max_distance,
            )
        })
    }
}

fn side_letter(
    letters: (Option<BaseLetter>, Option<BaseLetter>),
    side: PairSide,
) -> Option<BaseLetter> {
    match side {
        PairSide::First => letters.0,
        PairSide::Second => letters.1,
    }
}

fn template_for(residue: &Residue) -> Option<TemplateView<'static>> {
    db::lookup_residue(&residue.name).and_then(|r| db::get_template(r.parent))
}

/// Chooses the free slot best aligned with `direction`.
///
/// `Err(true)` means no slot is free; `Err(false)` means free slots exist but none is
/// aligned within tolerance. Ties keep the lowest slot index.
fn pick_slot(
    slots: &[Slot],
    used: &[bool],
    direction: &Vector3<f64>,
    min_cos: f64,
) -> Result<usize, bool> {
    let mut any_free = false;
    let mut best: Option<(usize, f64)> = None;

    for (index, slot) in slots.iter().enumerate() {
        if used[index] {
            continue;
        }
        any_free = true;
        let alignment = match slot {
            Slot::Isotropic => 1.0,
            Slot::Directed(axis) => axis.dot(direction),
        };
        if alignment >= min_cos && best.is_none_or(|(_, b)| alignment > b) {
            best = Some((index, alignment));
        }
    }

    match best {
        Some((index, _)) => Ok(index),
        None => Err(!any_free),
    }
}

fn polar_sites(residue: &Residue, template: Option<TemplateView<'_>>, side: PairSide) -> Vec<Site> {
    let mut sites = Vec::new();

    match template {
        Some(template) => {
            for (name, hybridization, hydrogens) in template.polar_atoms() {
                let Some(index) = residue.atom_index(name) else {
                    continue;
                };
                let atom = &residue.atoms()[index];
                if !atom.is_polar() {
                    continue;
                }
                let Some(cap) = capacity(atom.element, hybridization, hydrogens)
                    .or_else(|| generic_capacity(atom.element))
                else {
                    continue;
                };
                sites.push(Site {
                    side,
                    index,
                    name: atom.name.clone(),
                    pos: atom.pos,
                    donor_slots: slot_geometry(residue, index, cap.donors, Some(hybridization)),
                    acceptor_slots: slot_geometry(
                        residue,
                        index,
                        cap.acceptors,
                        Some(hybridization),
                    ),
                });
            }
        }
        None => {
            for (index, atom) in residue.iter_atoms().enumerate() {
                let Some(cap) = generic_capacity(atom.element) else {
                    continue;
                };
                sites.push(Site {
                    side,
                    index,
                    name: atom.name.clone(),
                    pos: atom.pos,
                    donor_slots: vec![Slot::Isotropic; cap.donors as usize],
                    acceptor_slots: vec![Slot::Isotropic; cap.acceptors as usize],
                });
            }
        }
    }

    sites
}

/// Heavy atoms of the residue bonded to atom `index`, in atom order.
fn heavy_neighbors(residue: &Residue, index: usize) -> Vec<usize> {
    let center = &residue.atoms()[index];
    residue
        .iter_atoms()
        .enumerate()
        .filter(|(i, atom)| {
            *i != index
                && atom.element.is_heavy_atom()
                && center.distance(atom) <= COVALENT_CUTOFF
        })
        .map(|(i, _)| i)
        .collect()
}

fn slot_geometry(
    residue: &Residue,
    index: usize,
    count: u8,
    hybridization: Option<Hybridization>,
) -> Vec<Slot> {
    let count = count as usize;
    if count == 0 {
        return Vec::new();
    }
    if hybridization != Some(Hybridization::Sp2) {
        return vec![Slot::Isotropic; count];
    }

    let atoms = residue.atoms();
    let pos = atoms[index].pos;
    let neighbors = heavy_neighbors(residue, index);

    match neighbors.as_slice() {
        [] => vec![Slot::Isotropic; count],
        [anchor] => {
            let bond = pos - atoms[*anchor].pos;
            if bond.norm() == 0.0 {
                return vec![Slot::Isotropic; count];
            }
            let bond = bond.normalize();
            if count == 1 {
                return vec![Slot::Directed(bond)];
            }

            let Some(second) = heavy_neighbors(residue, *anchor)
                .into_iter()
                .find(|&i| i != index)
            else {
                return vec![Slot::Isotropic; count];
            };
            let normal = (atoms[*anchor].pos - pos).cross(&(atoms[second].pos - atoms[*anchor].pos));
            if normal.norm() < 1e-6 {
                return vec![Slot::Isotropic; count];
            }
            let axis = Unit::new_normalize(normal);
            let offset = TRIGONAL_SLOT_OFFSET.to_radians();
            let mut slots = vec![
                Slot::Directed(Rotation3::from_axis_angle(&axis, offset) * bond),
                Slot::Directed(Rotation3::from_axis_angle(&axis, -offset) * bond),
            ];
            slots.resize(count, Slot::Isotropic);
            slots
        }
        many => {
            let bisector: Vector3<f64> = many
                .iter()
                .map(|&i| pos - atoms[i].pos)
                .filter(|v| v.norm() > 0.0)
                .map(|v| v.normalize())
                .sum();
            if bisector.norm() < 1e-6 {
                vec![Slot::Isotropic; count]
            } else {
                vec![Slot::Directed(bisector.normalize()); count]
            }
        }
    }
}
