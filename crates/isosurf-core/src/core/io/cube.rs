use crate::core::grid::{DataType, GridError, GridSize, ScalarGrid};
use crate::core::io::traits::VolumetricFile;
use nalgebra::{Point3, Vector3};
use ndarray::Axis;
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

pub const BOHR_TO_ANGSTROM: f64 = 0.529177210903;
pub const ANGSTROM_TO_BOHR: f64 = 1.0 / BOHR_TO_ANGSTROM;

const AXIS_TOLERANCE: f64 = 1e-6;
const VALUES_PER_LINE: usize = 6;

/// An atom record as stored in a cube file (position in Bohr).
#[derive(Debug, Clone, PartialEq)]
pub struct CubeAtom {
    pub atomic_number: i32,
    pub charge: f64,
    pub position: Point3<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CubeMetadata {
    pub title: String,
    pub comment: String,
    pub atoms: Vec<CubeAtom>,
    /// Orbital index of the stored data set, present for orbital cubes.
    pub orbital: Option<usize>,
}

#[derive(Debug, Error)]
pub enum CubeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: CubeParseErrorKind,
    },
    #[error("Invalid grid: {0}")]
    Grid(#[from] GridError),
}

#[derive(Debug, Error)]
pub enum CubeParseErrorKind {
    #[error("Invalid integer for {field} (value: '{value}')")]
    InvalidInt { field: &'static str, value: String },
    #[error("Invalid number for {field} (value: '{value}')")]
    InvalidFloat { field: &'static str, value: String },
    #[error("Missing {field}")]
    MissingField { field: &'static str },
    #[error("Unexpected end of file")]
    UnexpectedEof,
    #[error("Expected {expected} grid values, found {found}")]
    TooFewValues { expected: usize, found: usize },
    #[error("Grid of {counts:?} points with {data_sets} data set(s) is too large")]
    GridTooLarge { counts: [u64; 3], data_sets: u64 },
}

struct LineCursor<B> {
    lines: io::Lines<B>,
    number: usize,
}

impl<B: BufRead> LineCursor<B> {
    fn new(reader: B) -> Self {
        Self {
            lines: reader.lines(),
            number: 0,
        }
    }

    fn try_next_line(&mut self) -> Result<Option<(usize, String)>, CubeError> {
        match self.lines.next() {
            Some(line) => {
                self.number += 1;
                Ok(Some((self.number, line?)))
            }
            None => Ok(None),
        }
    }

    fn next_line(&mut self) -> Result<(usize, String), CubeError> {
        self.try_next_line()?.ok_or(CubeError::Parse {
            line: self.number + 1,
            kind: CubeParseErrorKind::UnexpectedEof,
        })
    }
}

fn parse_token<T: FromStr>(
    token: Option<&str>,
    field: &'static str,
    line: usize,
    invalid: fn(&'static str, String) -> CubeParseErrorKind,
) -> Result<T, CubeError> {
    let token = token.ok_or(CubeError::Parse {
        line,
        kind: CubeParseErrorKind::MissingField { field },
    })?;
    token.parse().map_err(|_| CubeError::Parse {
        line,
        kind: invalid(field, token.to_string()),
    })
}

fn parse_int<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    field: &'static str,
    line: usize,
) -> Result<i64, CubeError> {
    parse_token(tokens.next(), field, line, |field, value| {
        CubeParseErrorKind::InvalidInt { field, value }
    })
}

fn parse_float<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    field: &'static str,
    line: usize,
) -> Result<f64, CubeError> {
    parse_token(tokens.next(), field, line, |field, value| {
        CubeParseErrorKind::InvalidFloat { field, value }
    })
}

fn parse_indices<'a>(
    tokens: impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<Vec<i64>, CubeError> {
    tokens
        .map(|token| {
            parse_token(Some(token), "orbital index", line, |field, value| {
                CubeParseErrorKind::InvalidInt { field, value }
            })
        })
        .collect()
}

fn parse_vector<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    field: &'static str,
    line: usize,
) -> Result<Vector3<f64>, CubeError> {
    Ok(Vector3::new(
        parse_float(tokens, field, line)?,
        parse_float(tokens, field, line)?,
        parse_float(tokens, field, line)?,
    ))
}

/// Formats a value the way Gaussian writes cube data, e.g. ` 1.23450E-02`.
fn format_value(value: f64) -> String {
    let formatted = format!("{:.5E}", value);
    match formatted.split_once('E') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{:>8}E{}{:0>2}", mantissa, sign, digits)
        }
        None => formatted,
    }
}

fn check_axes(axes: &[Vector3<f64>; 3]) {
    let off_diagonal = [
        axes[0].y, axes[0].z, axes[1].x, axes[1].z, axes[2].x, axes[2].y,
    ];
    let spacing = [axes[0].x, axes[1].y, axes[2].z];
    if off_diagonal.iter().any(|v| v.abs() > AXIS_TOLERANCE) {
        warn!("Non-axial cube grid found; using the x spacing along every axis.");
    } else if (0..3).any(|a| (spacing[a] - spacing[(a + 1) % 3]).abs() > AXIS_TOLERANCE) {
        warn!(
            dx = spacing[0],
            dy = spacing[1],
            dz = spacing[2],
            "Non-regular cube grid found; using the x spacing along every axis."
        );
    }
}

/// Gaussian cube volumetric data.
pub struct CubeFile;

impl VolumetricFile for CubeFile {
    type Metadata = CubeMetadata;
    type Error = CubeError;

    fn read_from(reader: &mut impl BufRead) -> Result<(ScalarGrid, Self::Metadata), Self::Error> {
        let mut cursor = LineCursor::new(reader);
        let mut metadata = CubeMetadata {
            title: cursor.next_line()?.1.trim().to_string(),
            comment: cursor.next_line()?.1.trim().to_string(),
            ..Default::default()
        };

        let (n, line) = cursor.next_line()?;
        let mut tokens = line.split_whitespace();
        let atom_count = parse_int(&mut tokens, "atom count", n)?;
        let origin = parse_vector(&mut tokens, "grid origin", n)?;

        let mut counts = [0u64; 3];
        let mut axes = [Vector3::zeros(); 3];
        let mut in_bohr = true;
        for axis in 0..3 {
            let (n, line) = cursor.next_line()?;
            let mut tokens = line.split_whitespace();
            let count = parse_int(&mut tokens, "axis point count", n)?;
            if axis == 0 {
                in_bohr = count > 0;
            }
            counts[axis] = count.unsigned_abs();
            axes[axis] = parse_vector(&mut tokens, "axis vector", n)?;
        }

        for _ in 0..atom_count.unsigned_abs() {
            let (n, line) = cursor.next_line()?;
            let mut tokens = line.split_whitespace();
            let atomic_number = parse_int(&mut tokens, "atomic number", n)? as i32;
            let charge = parse_float(&mut tokens, "atomic charge", n)?;
            let position = parse_vector(&mut tokens, "atom position", n)?;
            metadata.atoms.push(CubeAtom {
                atomic_number,
                charge,
                position: Point3::from(position),
            });
        }

        let mut orbital_count = 1u64;
        if atom_count < 0 {
            let (n, line) = cursor.next_line()?;
            let mut tokens = line.split_whitespace();
            orbital_count = parse_int(&mut tokens, "orbital count", n)?.max(1).unsigned_abs();
            // The index list wraps onto further lines for long orbital selections.
            let mut indices = parse_indices(tokens, n)?;
            while (indices.len() as u64) < orbital_count {
                let (n, line) = cursor.next_line()?;
                let more = parse_indices(line.split_whitespace(), n)?;
                if more.is_empty() {
                    return Err(CubeError::Parse {
                        line: n,
                        kind: CubeParseErrorKind::MissingField {
                            field: "orbital index",
                        },
                    });
                }
                indices.extend(more);
            }
            metadata.orbital = indices
                .first()
                .and_then(|&index| usize::try_from(index.unsigned_abs()).ok());
            if orbital_count > 1 {
                warn!(
                    orbitals = orbital_count,
                    "Cube file holds several data sets; only the first is read."
                );
            }
        }

        let too_large = || CubeError::Parse {
            line: cursor.number,
            kind: CubeParseErrorKind::GridTooLarge {
                counts,
                data_sets: orbital_count,
            },
        };
        let expected = counts
            .iter()
            .try_fold(orbital_count, |acc, &n| acc.checked_mul(n))
            .and_then(|total| usize::try_from(total).ok())
            .ok_or_else(too_large)?;
        let data_sets = usize::try_from(orbital_count).map_err(|_| too_large())?;
        let mut dimensions = [0usize; 3];
        for axis in 0..3 {
            dimensions[axis] = usize::try_from(counts[axis]).map_err(|_| too_large())?;
        }

        let mut values = Vec::new();
        let mut found = 0usize;
        while let Some((n, line)) = cursor.try_next_line()? {
            for token in line.split_whitespace() {
                let value: f64 = parse_token(Some(token), "grid value", n, |field, value| {
                    CubeParseErrorKind::InvalidFloat { field, value }
                })?;
                if found < expected && found % data_sets == 0 {
                    values.push(value);
                }
                found += 1;
            }
        }
        if found < expected {
            return Err(CubeError::Parse {
                line: cursor.number,
                kind: CubeParseErrorKind::TooFewValues { expected, found },
            });
        }
        if found > expected {
            warn!(expected, found, "Ignoring trailing values in cube file.");
        }

        check_axes(&axes);
        let scale = if in_bohr { BOHR_TO_ANGSTROM } else { 1.0 };
        let step_size = axes[0].x * scale;
        let origin = origin * scale;

        let size = GridSize::from_origin(&Point3::from(origin), step_size, dimensions)?;
        let (corner, _) = size.bounding_box();
        let offset = origin - corner.coords;
        debug!(%size, bohr = in_bohr, atoms = metadata.atoms.len(), "Read cube grid.");

        let grid = ScalarGrid::from_values(DataType::CubeData, size, offset, values)?;
        Ok((grid, metadata))
    }

    fn write_to(
        grid: &ScalarGrid,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let h = grid.step_size() * ANGSTROM_TO_BOHR;
        let (corner, _) = grid.size().bounding_box();
        let origin = (corner.coords + grid.origin()) * ANGSTROM_TO_BOHR;
        let [nx, ny, nz] = grid.size().dimensions();

        if metadata.title.is_empty() {
            writeln!(writer, "Cube file for {}", grid.data_type())?;
        } else {
            writeln!(writer, "{}", metadata.title)?;
        }
        if metadata.comment.is_empty() {
            writeln!(writer, "Generated by isosurf")?;
        } else {
            writeln!(writer, "{}", metadata.comment)?;
        }

        let atom_count = metadata.atoms.len() as i64;
        let signed_count = if metadata.orbital.is_some() {
            -atom_count
        } else {
            atom_count
        };
        writeln!(
            writer,
            "{:5} {:13.6} {:13.6} {:13.6}",
            signed_count, origin.x, origin.y, origin.z
        )?;
        writeln!(writer, "{:5} {:13.6} {:13.6} {:13.6}", nx, h, 0.0, 0.0)?;
        writeln!(writer, "{:5} {:13.6} {:13.6} {:13.6}", ny, 0.0, h, 0.0)?;
        writeln!(writer, "{:5} {:13.6} {:13.6} {:13.6}", nz, 0.0, 0.0, h)?;

        for atom in &metadata.atoms {
            writeln!(
                writer,
                "{:5} {:13.6} {:13.6} {:13.6} {:13.6}",
                atom.atomic_number, atom.charge, atom.position.x, atom.position.y, atom.position.z
            )?;
        }
        if let Some(orbital) = metadata.orbital {
            writeln!(writer, "{:5}{:5}", 1, orbital)?;
        }

        for lane in grid.values().lanes(Axis(2)) {
            for (k, value) in lane.iter().enumerate() {
                write!(writer, " {}", format_value(*value))?;
                if (k + 1) % VALUES_PER_LINE == 0 || k + 1 == lane.len() {
                    writeln!(writer)?;
                }
            }
        }
        Ok(())
    }
}
