/// STL reader for binary and ASCII files
use std::path::Path;

use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, tuple},
    IResult,
};
use thiserror::Error;

use crate::geometry::{Mesh, Triangle, Vertex};

const HEADER_LEN: usize = 84;
const FACET_LEN: usize = 50;

#[derive(Debug, Error)]
pub enum StlError {
    #[error("file too small to be a binary STL ({0} bytes)")]
    TooShort(usize),
    #[error("binary STL declares {declared} facets but only holds {available}")]
    Truncated { declared: u32, available: usize },
    #[error("malformed ASCII STL near {0:?}")]
    Malformed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read and parse an STL file from disk
pub fn load_stl(path: impl AsRef<Path>) -> Result<Mesh, StlError> {
    let data = std::fs::read(path)?;
    parse_stl(&data)
}

/// Detect and parse STL data (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Mesh, StlError> {
    // Binary exporters sometimes start their header with "solid" too
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(data)
}

pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, StlError> {
    if data.len() < HEADER_LEN {
        return Err(StlError::TooShort(data.len()));
    }

    let (body, declared) =
        binary_header(data).map_err(|_| StlError::TooShort(data.len()))?;
    let truncated = StlError::Truncated {
        declared,
        available: body.len() / FACET_LEN,
    };
    if body.len() / FACET_LEN < declared as usize {
        return Err(truncated);
    }

    let (_, triangles) =
        count(binary_facet, declared as usize)(body).map_err(|_| truncated)?;
    Ok(Mesh { triangles })
}

pub fn parse_ascii_stl(input: &str) -> Result<Mesh, StlError> {
    match ascii_solid(input) {
        Ok((_, triangles)) => Ok(Mesh { triangles }),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            Err(StlError::Malformed(e.input.chars().take(32).collect()))
        }
        Err(nom::Err::Incomplete(_)) => Err(StlError::Malformed(String::new())),
    }
}

fn binary_header(input: &[u8]) -> IResult<&[u8], u32> {
    preceded(take(80usize), le_u32)(input)
}

fn binary_vector(input: &[u8]) -> IResult<&[u8], Vector3<f32>> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, Vector3::new(x, y, z)))
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    let (input, normal) = binary_vector(input)?;
    let (input, a) = binary_vector(input)?;
    let (input, b) = binary_vector(input)?;
    let (input, c) = binary_vector(input)?;
    let (input, _attributes) = le_u16(input)?;
    Ok((input, facet(normal, [a, b, c])))
}

fn ascii_solid(input: &str) -> IResult<&str, Vec<Triangle>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _name) = not_line_ending(input)?;
    let (input, triangles) = many0(ascii_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _name) = not_line_ending(input)?;
    Ok((input, triangles))
}

fn ascii_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = ascii_vector(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, corners) = count(preceded(preceded(multispace0, tag("vertex")), ascii_vector), 3)(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;
    Ok((input, facet(normal, [corners[0], corners[1], corners[2]])))
}

fn ascii_vector(input: &str) -> IResult<&str, Vector3<f32>> {
    let (input, (x, y, z)) = tuple((
        preceded(multispace1, float),
        preceded(multispace1, float),
        preceded(multispace1, float),
    ))(input)?;
    Ok((input, Vector3::new(x, y, z)))
}

/// Build a triangle, recomputing the normal when the file leaves it blank
fn facet(normal: Vector3<f32>, corners: [Vector3<f32>; 3]) -> Triangle {
    let [a, b, c] = corners.map(|p| Vertex::new(Point3::from(p), normal));
    let mut triangle = Triangle::new(a, b, c);
    if normal.norm_squared() < f32::EPSILON {
        let computed = triangle.face_normal();
        for vertex in &mut triangle.vertices {
            vertex.normal = computed;
        }
    }
    triangle
}
