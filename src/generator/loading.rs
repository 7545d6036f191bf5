//! Block loading
//!
//! Turns placement records into tiles and route nodes on the
//! battlefield. Terrain object sets load once per terrain per run; the
//! loaded-offsets map doubles as the "already loaded this terrain" set.

use ahash::AHashMap;

use crate::battlefield::node::RouteNode;
use crate::battlefield::state::Battlefield;
use crate::battlefield::tile::TilePart;
use crate::core::error::{GenError, Result};
use crate::core::types::{Position, CELL_SIZE};
use crate::generator::interpreter::PlacedBlock;
use crate::terrain::formats;
use crate::terrain::ruleset::Ruleset;
use crate::terrain::source::DataSource;

pub struct BlockLoader<'a> {
    ruleset: &'a Ruleset,
    source: &'a dyn DataSource,
    object_offsets: AHashMap<String, u16>,
}

impl<'a> BlockLoader<'a> {
    pub fn new(ruleset: &'a Ruleset, source: &'a dyn DataSource) -> Self {
        Self {
            ruleset,
            source,
            object_offsets: AHashMap::new(),
        }
    }

    /// Global object-table offset for a terrain, loading its object
    /// sets on first use
    pub fn terrain_offset(&mut self, field: &mut Battlefield, terrain: &str) -> Result<u16> {
        if let Some(offset) = self.object_offsets.get(terrain) {
            return Ok(*offset);
        }
        let definition = self.ruleset.terrain(terrain)?;
        let offset = field.objects.len() as u16;
        for set in &definition.object_sets {
            field.objects.extend(set.objects.iter().cloned());
        }
        tracing::debug!(
            terrain,
            offset,
            objects = field.objects.len() - offset as usize,
            "loaded terrain object sets"
        );
        self.object_offsets.insert(terrain.to_string(), offset);
        Ok(offset)
    }

    /// Load one placed block's tile and route data at its z offset
    ///
    /// Every node gets the given segment stamped on it; out-of-footprint
    /// route records become dummies rather than being dropped, so the
    /// link indices recorded in the file stay valid.
    pub fn load_block(
        &mut self,
        field: &mut Battlefield,
        placement: &PlacedBlock,
        segment: u16,
    ) -> Result<()> {
        let terrain = self.ruleset.terrain(&placement.terrain)?;
        let block = terrain.block(&placement.block).ok_or_else(|| {
            GenError::Ruleset(format!(
                "terrain '{}' has no block '{}'",
                placement.terrain, placement.block
            ))
        })?;

        let bytes = self.source.tile_data(&block.name)?;
        let tiles = formats::decode_block(&bytes).map_err(|source| GenError::Format {
            name: block.name.clone(),
            source,
        })?;

        if tiles.width != block.width || tiles.height != block.height {
            return Err(GenError::BlockSizeMismatch {
                name: block.name.clone(),
                declared_width: block.width,
                declared_height: block.height,
                header_width: tiles.width,
                header_height: tiles.height,
            });
        }
        if placement.z + tiles.levels > field.size().depth {
            return Err(GenError::HeightOverBudget {
                name: block.name.clone(),
                required: tiles.levels,
                offset: placement.z,
                depth: field.size().depth,
            });
        }

        let offset = self.terrain_offset(field, &placement.terrain)?;
        let origin = Position::new(
            (placement.cell.0 * CELL_SIZE) as i32,
            (placement.cell.1 * CELL_SIZE) as i32,
            placement.z as i32,
        );

        for (x, y, z, parts) in tiles.iter() {
            let tile = field
                .tile_mut(
                    origin.x as usize + x,
                    origin.y as usize + y,
                    placement.z + z,
                )
                .expect("block footprint validated against map bounds");
            for (slot, part) in TilePart::ALL.iter().zip(parts.iter()) {
                // Part byte zero means the slot is empty; everything
                // else is a 1-based index into the terrain's table.
                if *part != 0 {
                    tile.set_part(*slot, offset + (*part as u16 - 1));
                }
            }
        }

        let route_bytes = self.source.route_data(&block.name)?;
        let records = formats::decode_routes(&route_bytes).map_err(|source| GenError::Format {
            name: block.name.clone(),
            source,
        })?;
        let id_offset = field.nodes.len();
        for (index, record) in records.iter().enumerate() {
            let mut node = RouteNode::from_raw(record, id_offset + index, origin, segment, id_offset);
            let out_of_footprint = record.x as usize >= block.width
                || record.y as usize >= block.height
                || record.z as usize >= tiles.levels;
            if out_of_footprint || !field.in_bounds(node.pos) {
                node.dummy = true;
            }
            field.nodes.push(node);
        }

        tracing::debug!(
            block = %block.name,
            x = origin.x,
            y = origin.y,
            z = placement.z,
            segment,
            nodes = records.len(),
            "loaded block"
        );
        Ok(())
    }
}
