//! Index a structure's atoms by name, residue name, and residue number.

use std::collections::HashMap;

use crate::gro::GroAtom;
use crate::selection::Selection;

/// Multimaps from atom metadata to atom indices.
///
/// Built once from a parsed structure; every query returns a [`Selection`]
/// that can be combined with the set operations. The index lists are sorted
/// ascending by construction, which the selection algebra relies on.
#[derive(Debug, Default, Clone)]
pub struct Topology {
    natoms: usize,
    by_name: HashMap<String, Vec<u32>>,
    by_resname: HashMap<String, Vec<u32>>,
    by_resid: HashMap<u32, Vec<u32>>,
}

impl Topology {
    pub fn new(atoms: &[GroAtom]) -> Self {
        let mut topology = Topology {
            natoms: atoms.len(),
            ..Default::default()
        };
        for (idx, atom) in atoms.iter().enumerate() {
            let idx = idx as u32;
            topology
                .by_name
                .entry(atom.name.clone())
                .or_default()
                .push(idx);
            topology
                .by_resname
                .entry(atom.resname.clone())
                .or_default()
                .push(idx);
            topology.by_resid.entry(atom.resid).or_default().push(idx);
        }
        topology
    }

    /// Returns the number of atoms this [`Topology`] was built over.
    pub fn natoms(&self) -> usize {
        self.natoms
    }

    /// Select every atom.
    pub fn all(&self) -> Selection {
        Selection::from_sorted((0..self.natoms as u32).collect())
    }

    /// Select the atoms with the given atom name (e.g. `"OW"`).
    pub fn by_name(&self, name: &str) -> Selection {
        Selection::from_sorted(self.by_name.get(name).cloned().unwrap_or_default())
    }

    /// Select the atoms belonging to residues with the given name (e.g. `"SOL"`).
    pub fn by_resname(&self, resname: &str) -> Selection {
        Selection::from_sorted(self.by_resname.get(resname).cloned().unwrap_or_default())
    }

    /// Select the atoms belonging to the residue with the given number.
    pub fn by_resid(&self, resid: u32) -> Selection {
        Selection::from_sorted(self.by_resid.get(&resid).cloned().unwrap_or_default())
    }
}
