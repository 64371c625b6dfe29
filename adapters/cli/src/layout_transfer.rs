use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use stealth_nav_world::{GridError, WalkabilityGrid};

/// Leading `domain:version` pair of every layout string.
pub(crate) const LAYOUT_HEADER: &str = "grid:v1";

/// Names of the colon-separated fields, in order.
const FIELDS: [&str; 4] = ["domain", "version", "size", "payload"];

/// Walkability layout that can be moved between tools as a single line.
///
/// The line reads `grid:v1:<columns>x<rows>:<payload>`, where the payload is
/// unpadded base64 over JSON holding the cell size, origin and rows.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GridLayout {
    pub columns: u32,
    pub rows: u32,
    pub cell_size: f32,
    /// World position of the center of cell (0, 0).
    pub origin: Vec2,
    /// One string per row using `.` for walkable and `#` for blocked cells.
    pub cells: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct Payload {
    cell_size: f32,
    origin: Vec2,
    cells: Vec<String>,
}

/// Reasons a layout string could not be produced or read back.
#[derive(Debug, thiserror::Error)]
pub(crate) enum LayoutTransferError {
    #[error("layout string is blank")]
    Blank,
    #[error("layout string has no {0} field")]
    MissingField(&'static str),
    #[error("expected a grid:v1 layout, found {0}")]
    UnknownHeader(String),
    #[error("'{0}' is not a <columns>x<rows> size with both sides above zero")]
    BadSize(String),
    #[error("layout payload is not unpadded base64")]
    Encoding(#[from] base64::DecodeError),
    #[error("layout payload is not valid JSON")]
    Payload(#[from] serde_json::Error),
    #[error("layout rows do not form a grid")]
    Grid(#[from] GridError),
    #[error("layout declares {declared:?} cells but its rows hold {actual:?}")]
    SizeMismatch {
        declared: (u32, u32),
        actual: (u32, u32),
    },
}

impl GridLayout {
    #[must_use]
    pub(crate) fn capture(grid: &WalkabilityGrid) -> Self {
        Self {
            columns: grid.columns(),
            rows: grid.rows(),
            cell_size: grid.cell_size(),
            origin: grid.origin(),
            cells: grid.to_ascii().lines().map(str::to_owned).collect(),
        }
    }

    /// Rebuilds the grid, checking the rows against the declared size.
    pub(crate) fn to_grid(&self) -> Result<WalkabilityGrid, LayoutTransferError> {
        let grid = WalkabilityGrid::from_ascii(&self.cells.join("\n"), self.cell_size, self.origin)?;
        let declared = (self.columns, self.rows);
        if grid.dimensions() != declared {
            return Err(LayoutTransferError::SizeMismatch {
                declared,
                actual: grid.dimensions(),
            });
        }
        Ok(grid)
    }

    pub(crate) fn encode(&self) -> Result<String, LayoutTransferError> {
        let json = serde_json::to_vec(&Payload {
            cell_size: self.cell_size,
            origin: self.origin,
            cells: self.cells.clone(),
        })?;
        Ok(format!(
            "{LAYOUT_HEADER}:{}x{}:{}",
            self.columns,
            self.rows,
            STANDARD_NO_PAD.encode(json)
        ))
    }

    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(LayoutTransferError::Blank);
        }

        let [domain, version, size, payload] = split_fields(value)?;
        let header = format!("{domain}:{version}");
        if header != LAYOUT_HEADER {
            return Err(LayoutTransferError::UnknownHeader(header));
        }

        let (columns, rows) = parse_size(size)?;
        let payload: Payload = serde_json::from_slice(&STANDARD_NO_PAD.decode(payload)?)?;
        Ok(Self {
            columns,
            rows,
            cell_size: payload.cell_size,
            origin: payload.origin,
            cells: payload.cells,
        })
    }
}

fn split_fields(value: &str) -> Result<[&str; 4], LayoutTransferError> {
    let mut parts = value.splitn(FIELDS.len(), ':');
    let mut fields = [""; 4];
    for (field, name) in fields.iter_mut().zip(FIELDS) {
        *field = parts
            .next()
            .ok_or(LayoutTransferError::MissingField(name))?;
    }
    Ok(fields)
}

fn parse_size(size: &str) -> Result<(u32, u32), LayoutTransferError> {
    let side = |text: &str| text.trim().parse::<u32>().ok().filter(|&value| value > 0);
    size.split_once(['x', 'X'])
        .and_then(|(columns, rows)| Some((side(columns)?, side(rows)?)))
        .ok_or_else(|| LayoutTransferError::BadSize(size.to_owned()))
}
