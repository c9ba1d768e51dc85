pub mod corpus;
pub mod unit;

pub use corpus::Corpus;
pub use unit::{
    ExcelUnitMeta, FileType, MetaValue, PdfUnitMeta, TextUnit, TxtUnitMeta, UnitMetadata,
};
