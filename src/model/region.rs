//! Layout regions: rectangular groupings of words on a page.

use crate::geometry::BoundingBox;
use crate::model::attributes::{Attributed, Attributes};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved region type names.
pub mod region_types {
    /// Whole page
    pub const PAGE: &str = "page";
    /// Text block
    pub const BLOCK: &str = "block";
    /// Text column
    pub const COLUMN: &str = "column";
    /// Paragraph
    pub const PARAGRAPH: &str = "paragraph";
    /// Text line
    pub const LINE: &str = "line";
    /// Table
    pub const TABLE: &str = "table";
    /// Table row
    pub const TABLE_ROW: &str = "tableRow";
    /// Table column
    pub const TABLE_COL: &str = "tableCol";
    /// Table cell
    pub const TABLE_CELL: &str = "tableCell";
    /// Bitmap image
    pub const IMAGE: &str = "image";
    /// Vector graphics
    pub const GRAPHICS: &str = "graphics";

    /// Whether a region type belongs to table structure.
    pub fn is_table_part(region_type: &str) -> bool {
        matches!(region_type, TABLE | TABLE_ROW | TABLE_COL | TABLE_CELL)
    }
}

/// Handle of a region within its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub(crate) u32);

impl RegionId {
    /// Arena index of this region.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region#{}", self.0)
    }
}

/// A typed rectangle on a page.
#[derive(Debug, Clone)]
pub struct Region {
    pub(crate) id: RegionId,
    pub(crate) page_id: u32,
    pub(crate) bounds: BoundingBox,
    pub(crate) region_type: String,
    pub(crate) attached: bool,
    pub(crate) attributes: Attributes,
}

impl Region {
    pub(crate) fn new(id: RegionId, page_id: u32, bounds: BoundingBox, region_type: String) -> Self {
        Self {
            id,
            page_id,
            bounds,
            region_type,
            attached: true,
            attributes: Attributes::new(),
        }
    }

    /// Handle of this region.
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Id of the page the region lies on.
    pub fn page_id(&self) -> u32 {
        self.page_id
    }

    /// Bounding box.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Region type tag.
    pub fn region_type(&self) -> &str {
        &self.region_type
    }

    /// Whether the region is still registered with its page.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Whether this region is a table.
    pub fn is_table(&self) -> bool {
        self.region_type == region_types::TABLE
    }

    /// Page-local id, `"<type>@<pageId>.<bounds>"`.
    pub fn local_id(&self) -> String {
        format!("{}@{}.{}", self.region_type, self.page_id, self.bounds)
    }
}

impl Attributed for Region {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}
