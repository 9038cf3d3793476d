//! Read gromacs xtc trajectories and gro structure files.
//!
//! The xtc coordinate codec is decoded bit-exactly: xdr framing, adaptive
//! mixed-radix bit packing, and the run-length trick for small clusters of
//! covalently bonded atoms. [`read_xtc`] loads a whole trajectory into
//! memory; [`each_frame`] streams it through a single reusable frame without
//! allocating per step.
//!
//! ```no_run
//! let mut frames = mdio::each_frame("md.xtc")?;
//! while let Some(frame) = frames.next_frame()? {
//!     println!("t = {} ps, {} atoms", frame.time, frame.natoms());
//! }
//! # Ok::<(), mdio::Error>(())
//! ```

use std::cell::Cell;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use glam::{Mat3, Vec3};

use crate::reader::{
    read_boxvec, read_compressed_positions, read_f32, read_f32s, read_u32,
};

pub mod error;
pub mod gro;
pub mod reader;
pub mod selection;
pub mod topology;

pub use error::{Error, Result};
pub use gro::{parse_gro, read_gro, GroAtom, Structure};
pub use selection::Selection;
pub use topology::Topology;

// See https://gitlab.com/gromacs/gromacs/-/blob/v2024.1/src/gromacs/fileio/xdrf.h?ref_type=tags#L78
pub const XTC_1995_MAX_NATOMS: usize = 298261617;

thread_local! {
    /// A scratch buffer to read encoded bytes into for subsequent decoding.
    static SCRATCH: Cell<Vec<u8>> = const { Cell::new(Vec::new()) };
}

pub type BoxVec = Mat3;

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Magic {
    Xtc1995 = 1995,
    Xtc2023 = 2023,
}

impl Magic {
    pub const XTC_1995: i32 = Magic::Xtc1995 as _;
    pub const XTC_2023: i32 = Magic::Xtc2023 as _;
}

impl TryFrom<i32> for Magic {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            Magic::XTC_1995 => Ok(Self::Xtc1995),
            Magic::XTC_2023 => Ok(Self::Xtc2023),
            unknown => Err(Error::BadMagic(unknown)),
        }
    }
}

impl std::fmt::Display for Magic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", *self as i32)
    }
}

/// The header of a single xtc frame.
pub struct Header {
    pub magic: Magic,
    pub natoms: usize,
    pub step: i64,
    pub time: f32,
    pub boxvec: Mat3,
    /// The atom count repeated at the start of the coordinate block (lsize).
    ///
    /// Decoding trusts this value; a mismatch with `natoms` is reported as a
    /// warning but is not fatal.
    pub natoms_repeated: usize,
}

impl Header {
    pub const SIZE: usize = 4 * (5 + 9);

    /// Read the header at the start of a frame.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly at the frame boundary,
    /// which is the normal end of a trajectory. Running dry anywhere past the
    /// first byte of the header is an [`Error::UnexpectedEof`].
    pub fn read(file: &mut impl Read) -> Result<Option<Self>> {
        let Some(magic) = read_magic(file)? else {
            return Ok(None);
        };
        let magic = Magic::try_from(magic)?;
        let natoms = read_u32(file)? as usize;
        // The wire stores the step as 32 bits; zero-extend it.
        let step = read_u32(file)? as i64;
        let time = read_f32(file)?;

        let boxvec = read_boxvec(file)?;
        let natoms_repeated = read_u32(file)? as usize;
        if natoms_repeated != natoms {
            tracing::warn!(
                natoms,
                natoms_repeated,
                "atom count in the coordinate block contradicts the header; using the block's"
            );
        }
        if magic == Magic::Xtc1995 && natoms > XTC_1995_MAX_NATOMS {
            tracing::warn!(
                natoms,
                "atom count exceeds the maximum the {} format can hold",
                Magic::Xtc1995
            );
        }

        Ok(Some(Header {
            magic,
            natoms,
            step,
            time,
            boxvec,
            natoms_repeated,
        }))
    }
}

/// Read the frame magic, distinguishing clean end-of-stream from truncation.
fn read_magic(file: &mut impl Read) -> Result<Option<i32>> {
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(Error::UnexpectedEof("the frame magic")),
            Ok(n) => filled += n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(Error::Io(err)),
        }
    }
    Ok(Some(i32::from_be_bytes(buf)))
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Frame {
    pub step: i64,
    /// Time in picoseconds.
    pub time: f32,
    pub boxvec: BoxVec,
    /// The precision the coordinates were compressed with, or -1.0 for the
    /// small systems (9 atoms or fewer) that are stored uncompressed.
    pub precision: f32,
    pub positions: Vec<f32>,
}

impl Frame {
    /// Returns an iterator over the coordinates stored in this [`Frame`].
    pub fn coords(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.positions.chunks_exact(3).map(Vec3::from_slice)
    }

    /// Returns the number of atoms in this [`Frame`].
    pub fn natoms(&self) -> usize {
        let npos = self.positions.len();
        assert_eq!(
            npos % 3,
            0,
            "the number of single positions in a frame must always be a multiple of 3"
        );
        npos / 3
    }
}

/// A whole trajectory loaded into memory.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Trajectory {
    pub path: PathBuf,
    pub natoms: usize,
    pub frames: Vec<Frame>,
}

impl Trajectory {
    pub fn nframes(&self) -> usize {
        self.frames.len()
    }
}

#[derive(Debug, Clone)]
pub struct XTCReader<R> {
    pub file: R,
    pub step: usize,
    /// Magic number of the most recently read frame header.
    pub magic: Option<Magic>,
}

impl XTCReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> XTCReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            file: reader,
            step: 0,
            magic: None,
        }
    }

    /// Read the header at the start of a frame.
    ///
    /// Assumes the internal reader is at the start of a new frame header.
    pub fn read_header(&mut self) -> Result<Option<Header>> {
        Header::read(&mut self.file)
    }

    /// Read a small number of uncompressed positions.
    ///
    /// # Panics
    ///
    /// `natoms` must be 9 or less, otherwise the positions must be
    /// decompressed and cannot be read directly through this function.
    ///
    /// Oh xtc, you are so fucking weird.
    fn read_smol_positions(&mut self, natoms: usize, frame: &mut Frame) -> Result<()> {
        assert!(
            natoms <= 9,
            "only read uncompressed positions when the number of atoms is 9 or less"
        );

        // In case the number of atoms is very small, just read their uncompressed positions.
        let mut buf = [0.0; 9 * 3]; // We have at most 9 atoms, so we handle them on the stack.
        let buf = &mut buf[..natoms * 3];
        read_f32s(&mut self.file, buf)?;
        frame.positions.clear();
        frame.positions.extend_from_slice(buf);
        // These positions were never compressed, so there is no precision to
        // report; -1 marks the value as absent.
        frame.precision = -1.0;

        Ok(())
    }

    /// A convenience function to read all frames in a trajectory.
    ///
    /// It is likely more efficient to use [`XTCReader::read_frame`] if you are
    /// only interested in the values of a single frame at a time.
    pub fn read_all_frames(&mut self) -> Result<Vec<Frame>> {
        let mut frames = Vec::new();
        loop {
            let mut frame = Frame::default();
            if !self.read_frame(&mut frame)? {
                break;
            }
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Reads a [`Frame`] and advances one step.
    ///
    /// Returns `false` when the stream ends cleanly before another frame, in
    /// which case `frame` is left untouched.
    pub fn read_frame(&mut self, frame: &mut Frame) -> Result<bool> {
        // Take the thread-local SCRATCH and use that while decoding the values.
        let mut scratch = SCRATCH.take();
        let more = self.read_frame_with_scratch(frame, &mut scratch);
        SCRATCH.set(scratch);
        more
    }

    /// Reads a [`Frame`] and advances one step, internally reading the
    /// compressed data into `scratch`.
    ///
    /// This function performs the work of [`XTCReader::read_frame`], but
    /// leaves all allocations to the caller. The contents of `scratch` should
    /// not be depended upon! It just serves as a scratch buffer for the inner
    /// workings of decoding.
    pub fn read_frame_with_scratch(
        &mut self,
        frame: &mut Frame,
        scratch: &mut Vec<u8>,
    ) -> Result<bool> {
        let Some(header) = self.read_header()? else {
            return Ok(false);
        };
        self.magic = Some(header.magic);

        // The coordinate block declares its own atom count; trust it.
        let lsize = header.natoms_repeated;
        if lsize <= 9 {
            self.read_smol_positions(lsize, frame)?;
        } else {
            frame.positions.resize(lsize * 3, 0.0);
            frame.precision = read_f32(&mut self.file)?;
            read_compressed_positions(
                &mut self.file,
                lsize,
                &mut frame.positions,
                frame.precision,
                scratch,
                header.magic,
            )?;
        }

        self.step += 1;

        frame.step = header.step;
        frame.time = header.time;
        frame.boxvec = header.boxvec;

        Ok(true)
    }
}

/// Streaming iterator over the frames of an xtc file.
///
/// Owns a single [`Frame`] and scratch buffer; every [`next_frame`] call
/// overwrites them in place, so traversing a multi-gigabyte trajectory does
/// not allocate per frame. Callers that need to keep a frame around must
/// clone it.
///
/// [`next_frame`]: FrameIter::next_frame
pub struct FrameIter {
    reader: XTCReader<BufReader<File>>,
    frame: Frame,
    scratch: Vec<u8>,
}

impl FrameIter {
    /// Decode the next frame, lending it out until the next call.
    ///
    /// `Ok(None)` signals the end of the trajectory. A file that ends in the
    /// middle of a frame surfaces as [`Error::UnexpectedEof`] instead.
    pub fn next_frame(&mut self) -> Result<Option<&Frame>> {
        if self
            .reader
            .read_frame_with_scratch(&mut self.frame, &mut self.scratch)?
        {
            Ok(Some(&self.frame))
        } else {
            Ok(None)
        }
    }

    /// Magic number of the most recently read frame.
    pub fn magic(&self) -> Option<Magic> {
        self.reader.magic
    }
}

/// Load all frames of an xtc file into memory.
pub fn read_xtc<P: AsRef<Path>>(path: P) -> Result<Trajectory> {
    let path = path.as_ref();
    let mut reader = XTCReader::open(path)?;
    let frames = reader.read_all_frames()?;

    let natoms = frames.first().map(Frame::natoms).unwrap_or_default();
    if frames.iter().any(|frame| frame.natoms() != natoms) {
        tracing::warn!(
            path = %path.display(),
            "frames disagree on the number of atoms"
        );
    }

    Ok(Trajectory {
        path: path.to_path_buf(),
        natoms,
        frames,
    })
}

/// Stream the frames of an xtc file through a single reusable buffer.
pub fn each_frame<P: AsRef<Path>>(path: P) -> Result<FrameIter> {
    let reader = XTCReader::open(path)?;
    Ok(FrameIter {
        reader,
        frame: Frame::default(),
        scratch: Vec::new(),
    })
}
