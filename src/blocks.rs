//! Block dispatch: maps extension block opcodes onto [`MapSession`] calls.
//!
//! Hosts hand over arguments as loosely typed JSON. Numbers and numeric
//! strings are accepted; anything else fails here rather than turning into
//! `NaN` further down.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::core::constants::MAX_ZOOM;
use crate::core::geo::TileCoord;
use crate::core::projection::BoundingBox;
use crate::session::{MapSession, MapTile};
use crate::tiles::cache::TileImage;
use crate::{MapError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Block {
    SetMapCenter,
    SetMapCenterByAddress,
    SetZoom,
    GetCurrentLatitude,
    GetCurrentLongitude,
    GetCurrentZoom,
    CalculateDistance,
    CalculateDistanceBetweenPoints,
    GetDistanceFromCenter,
    GetBearing,
    GetMapUrl,
    GetMapUrlForCoordinate,
    GetBoundingBox,
    FetchTileImage,
    DrawTileMap,
    DrawTileMapByAddress,
    ClearTileCache,
}

impl Block {
    pub const ALL: [Block; 17] = [
        Block::SetMapCenter,
        Block::SetMapCenterByAddress,
        Block::SetZoom,
        Block::GetCurrentLatitude,
        Block::GetCurrentLongitude,
        Block::GetCurrentZoom,
        Block::CalculateDistance,
        Block::CalculateDistanceBetweenPoints,
        Block::GetDistanceFromCenter,
        Block::GetBearing,
        Block::GetMapUrl,
        Block::GetMapUrlForCoordinate,
        Block::GetBoundingBox,
        Block::FetchTileImage,
        Block::DrawTileMap,
        Block::DrawTileMapByAddress,
        Block::ClearTileCache,
    ];

    pub fn opcode(&self) -> &'static str {
        match self {
            Block::SetMapCenter => "setMapCenter",
            Block::SetMapCenterByAddress => "setMapCenterByAddress",
            Block::SetZoom => "setZoom",
            Block::GetCurrentLatitude => "getCurrentLatitude",
            Block::GetCurrentLongitude => "getCurrentLongitude",
            Block::GetCurrentZoom => "getCurrentZoom",
            Block::CalculateDistance => "calculateDistance",
            Block::CalculateDistanceBetweenPoints => "calculateDistanceBetweenPoints",
            Block::GetDistanceFromCenter => "getDistanceFromCenter",
            Block::GetBearing => "getBearing",
            Block::GetMapUrl => "getMapUrl",
            Block::GetMapUrlForCoordinate => "getMapUrlForCoordinate",
            Block::GetBoundingBox => "getBoundingBox",
            Block::FetchTileImage => "fetchTileImage",
            Block::DrawTileMap => "drawTileMap",
            Block::DrawTileMapByAddress => "drawTileMapByAddress",
            Block::ClearTileCache => "clearTileCache",
        }
    }
}

impl FromStr for Block {
    type Err = MapError;

    fn from_str(opcode: &str) -> Result<Self> {
        Block::ALL
            .iter()
            .copied()
            .find(|block| block.opcode() == opcode)
            .ok_or_else(|| MapError::UnknownBlock(opcode.to_string()))
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode())
    }
}

/// One block invocation as sent by a host
#[derive(Debug, Clone, Deserialize)]
pub struct BlockRequest {
    pub opcode: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

/// What a block reports back
#[derive(Debug, Clone)]
pub enum BlockOutput {
    /// Command blocks
    None,
    Number(f64),
    Text(String),
    Bounds(BoundingBox),
    Tile { coord: TileCoord, image: TileImage },
}

impl From<MapTile> for BlockOutput {
    fn from(tile: MapTile) -> Self {
        BlockOutput::Tile {
            coord: tile.coord,
            image: tile.image,
        }
    }
}

impl BlockOutput {
    pub fn to_json(&self) -> Value {
        match self {
            BlockOutput::None => Value::Null,
            BlockOutput::Number(n) => json!(n),
            BlockOutput::Text(s) => json!(s),
            BlockOutput::Bounds(b) => json!(b),
            BlockOutput::Tile { coord, image } => json!({
                "tile": coord.to_string(),
                "width": image.width(),
                "height": image.height(),
            }),
        }
    }
}

/// Typed view over a block's raw arguments
struct BlockArgs<'a> {
    block: Block,
    args: &'a Map<String, Value>,
}

impl<'a> BlockArgs<'a> {
    fn raw(&self, name: &str) -> Result<&'a Value> {
        self.args.get(name).ok_or_else(|| {
            MapError::InvalidArgument(format!("{} is missing argument {}", self.block, name))
        })
    }

    fn number(&self, name: &str) -> Option<f64> {
        let parsed = match self.args.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed.filter(|n| n.is_finite())
    }

    fn coordinate(&self, name: &str) -> Result<f64> {
        let raw = self.raw(name)?;
        self.number(name).ok_or_else(|| {
            MapError::InvalidCoordinate(format!("{} = {} is not a number", name, raw))
        })
    }

    fn dimension(&self, name: &str) -> Result<f64> {
        let raw = self.raw(name)?;
        self.number(name).ok_or_else(|| {
            MapError::InvalidDimensions(format!("{} = {} is not a number", name, raw))
        })
    }

    fn zoom(&self, name: &str) -> Result<u8> {
        let raw = self.raw(name)?;
        match self.number(name) {
            Some(z) if z.fract() == 0.0 && (0.0..=MAX_ZOOM as f64).contains(&z) => Ok(z as u8),
            _ => Err(MapError::InvalidZoom(format!(
                "{} = {} is not a whole zoom level in 0..={}",
                name, raw, MAX_ZOOM
            ))),
        }
    }

    fn text(&self, name: &str) -> Result<String> {
        match self.raw(name)? {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(MapError::InvalidArgument(format!(
                "{} = {} is not text",
                name, other
            ))),
        }
    }
}

/// Runs one block against `session`
pub async fn run_block(session: &mut MapSession, request: &BlockRequest) -> Result<BlockOutput> {
    let block: Block = request.opcode.parse()?;
    let args = BlockArgs {
        block,
        args: &request.args,
    };
    log::debug!("running block {}", block);

    let output = match block {
        Block::SetMapCenter => {
            session.set_center(args.coordinate("LATITUDE")?, args.coordinate("LONGITUDE")?)?;
            BlockOutput::None
        }
        Block::SetMapCenterByAddress => {
            session
                .set_center_by_address(&args.text("ADDRESS")?, args.zoom("ZOOM")?)
                .await?;
            BlockOutput::None
        }
        Block::SetZoom => {
            session.set_zoom(args.zoom("ZOOM")?)?;
            BlockOutput::None
        }
        Block::GetCurrentLatitude => BlockOutput::Number(session.latitude()),
        Block::GetCurrentLongitude => BlockOutput::Number(session.longitude()),
        Block::GetCurrentZoom => BlockOutput::Number(session.zoom() as f64),
        Block::CalculateDistance | Block::CalculateDistanceBetweenPoints => {
            BlockOutput::Number(session.distance_between(
                args.coordinate("LAT1")?,
                args.coordinate("LON1")?,
                args.coordinate("LAT2")?,
                args.coordinate("LON2")?,
            )?)
        }
        Block::GetDistanceFromCenter => BlockOutput::Number(
            session.distance_from_center(args.coordinate("LAT")?, args.coordinate("LON")?)?,
        ),
        Block::GetBearing => BlockOutput::Number(session.bearing_between(
            args.coordinate("LAT1")?,
            args.coordinate("LON1")?,
            args.coordinate("LAT2")?,
            args.coordinate("LON2")?,
        )?),
        Block::GetMapUrl => BlockOutput::Text(session.map_url()),
        Block::GetMapUrlForCoordinate => BlockOutput::Text(session.map_url_for(
            args.coordinate("LAT")?,
            args.coordinate("LON")?,
            args.zoom("ZOOM")?,
        )?),
        Block::GetBoundingBox => BlockOutput::Bounds(
            session.bounding_box_of_view(args.dimension("WIDTH")?, args.dimension("HEIGHT")?)?,
        ),
        Block::FetchTileImage => {
            let tile = session
                .fetch_tile_image(
                    args.coordinate("LAT")?,
                    args.coordinate("LON")?,
                    args.zoom("ZOOM")?,
                )
                .await?;
            tile.into()
        }
        Block::DrawTileMap => {
            let tile = session
                .draw_tile_map(
                    args.coordinate("LATITUDE")?,
                    args.coordinate("LONGITUDE")?,
                    args.zoom("ZOOM")?,
                )
                .await?;
            tile.into()
        }
        Block::DrawTileMapByAddress => {
            let tile = session
                .draw_tile_map_by_address(&args.text("ADDRESS")?, args.zoom("ZOOM")?)
                .await?;
            tile.into()
        }
        Block::ClearTileCache => {
            session.clear_tile_cache();
            BlockOutput::None
        }
    };

    Ok(output)
}
