//! Fixed-column parser for gromacs gro structure files.
//!
//! The format is line-oriented: a free-form title, an atom count, one
//! fixed-column line per atom, and a final line of box vectors. Positions are
//! in nm. Velocity columns are optional and detected per line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use glam::{Mat3, Vec3};

use crate::error::{Error, Result};
use crate::BoxVec;

/// One atom line of a gro file.
#[derive(Debug, Clone, PartialEq)]
pub struct GroAtom {
    /// Residue number (column 1-5).
    pub resid: u32,
    /// Residue name (column 6-10).
    pub resname: String,
    /// Atom name (column 11-15).
    pub name: String,
    /// Atom number (column 16-20).
    pub serial: u32,
    /// Position in nm.
    pub position: Vec3,
    /// Velocity in nm/ps, when the file carries velocity columns.
    pub velocity: Option<Vec3>,
}

/// A parsed gro structure: title, atoms, and the box matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub title: String,
    pub atoms: Vec<GroAtom>,
    pub boxvec: BoxVec,
}

impl Structure {
    /// Returns the number of atoms in this [`Structure`].
    pub fn natoms(&self) -> usize {
        self.atoms.len()
    }
}

/// Read a gro structure file from a path.
pub fn read_gro<P: AsRef<Path>>(path: P) -> Result<Structure> {
    parse_gro(BufReader::new(File::open(path)?))
}

/// Parse a gro structure from any buffered reader.
pub fn parse_gro(reader: impl BufRead) -> Result<Structure> {
    let mut lines = reader.lines().enumerate();

    let mut next_line = |what: &str| -> Result<(usize, String)> {
        match lines.next() {
            Some((idx, Ok(line))) => Ok((idx + 1, line)),
            Some((_, Err(err))) => Err(Error::Io(err)),
            None => Err(Error::ParseGro {
                line: 0,
                reason: format!("file ended before the {what}"),
            }),
        }
    };

    let (_, title) = next_line("title line")?;
    let (line, natoms) = next_line("atom count")?;
    let natoms: usize = natoms.trim().parse().map_err(|_| Error::ParseGro {
        line,
        reason: format!("expected an atom count, found {:?}", natoms.trim()),
    })?;

    let mut atoms = Vec::with_capacity(natoms);
    for _ in 0..natoms {
        let (line, text) = next_line("next atom line")?;
        atoms.push(parse_atom_line(&text, line)?);
    }

    let (line, text) = next_line("box line")?;
    let boxvec = parse_box_line(&text, line)?;

    Ok(Structure {
        title: title.trim_end().to_string(),
        atoms,
        boxvec,
    })
}

/// Slice a fixed-column field out of an atom line.
fn field(text: &str, range: std::ops::Range<usize>, line: usize) -> Result<&str> {
    text.get(range.clone()).ok_or_else(|| Error::ParseGro {
        line,
        reason: format!("line is too short for the {}-{} column field", range.start + 1, range.end),
    })
}

fn parse_atom_line(text: &str, line: usize) -> Result<GroAtom> {
    let number = |range: std::ops::Range<usize>, what: &str| -> Result<u32> {
        let raw = field(text, range, line)?.trim();
        raw.parse().map_err(|_| Error::ParseGro {
            line,
            reason: format!("expected a {what}, found {raw:?}"),
        })
    };
    let float = |range: std::ops::Range<usize>, what: &str| -> Result<f32> {
        let raw = field(text, range, line)?.trim();
        raw.parse().map_err(|_| Error::ParseGro {
            line,
            reason: format!("expected a {what}, found {raw:?}"),
        })
    };

    let resid = number(0..5, "residue number")?;
    let resname = field(text, 5..10, line)?.trim().to_string();
    let name = field(text, 10..15, line)?.trim().to_string();
    let serial = number(15..20, "atom number")?;

    let position = Vec3::new(
        float(20..28, "position")?,
        float(28..36, "position")?,
        float(36..44, "position")?,
    );

    // Velocity columns are present iff the line extends past the positions.
    let velocity = if text.trim_end().len() > 44 {
        Some(Vec3::new(
            float(44..52, "velocity")?,
            float(52..60, "velocity")?,
            float(60..68, "velocity")?,
        ))
    } else {
        None
    };

    Ok(GroAtom {
        resid,
        resname,
        name,
        serial,
        position,
        velocity,
    })
}

/// Parse the final box line: 3 values for a rectangular box, 9 for triclinic.
///
/// The order is `v1x v2y v3z [v1y v1z v2x v2z v3x v3y]`, per the format.
fn parse_box_line(text: &str, line: usize) -> Result<Mat3> {
    let values = text
        .split_whitespace()
        .map(|raw| {
            raw.parse::<f32>().map_err(|_| Error::ParseGro {
                line,
                reason: format!("expected a box vector component, found {raw:?}"),
            })
        })
        .collect::<Result<Vec<f32>>>()?;

    let [v1, v2, v3] = match values[..] {
        [v1x, v2y, v3z] => [[v1x, 0.0, 0.0], [0.0, v2y, 0.0], [0.0, 0.0, v3z]],
        [v1x, v2y, v3z, v1y, v1z, v2x, v2z, v3x, v3y] => {
            [[v1x, v1y, v1z], [v2x, v2y, v2z], [v3x, v3y, v3z]]
        }
        _ => {
            return Err(Error::ParseGro {
                line,
                reason: format!("expected 3 or 9 box values, found {}", values.len()),
            })
        }
    };

    // Rows on the wire, columns for glam.
    Ok(Mat3::from_cols_array_2d(&[
        [v1[0], v2[0], v3[0]],
        [v1[1], v2[1], v3[1]],
        [v1[2], v2[2], v3[2]],
    ]))
}
