//! # Somoco Common
//!
//! Catalog types and storefront logic shared by the API server and any front end.
//!
//! ## Modules
//!
//! - `vehicle`: typed CMS documents (vehicles, partners, specification sections)
//! - `compare`: side-by-side alignment of two vehicles' parameter lists
//! - `catalog`: listing filters, facets, ranking order and pagination
//! - `scroll`: wheel/touch driven section navigation for the home page
//! - `modal`: the site-wide modal state container
//! - `assets`: CMS asset reference to CDN URL resolution
//! - `envelope`: the `{success, data|error}` JSON envelope

pub mod assets;
pub mod catalog;
pub mod compare;
pub mod envelope;
pub mod error;
pub mod modal;
pub mod scroll;
pub mod vehicle;

pub use assets::AssetUrls;
pub use catalog::{bump_rankings, CatalogPage, CatalogQuery, Facets, RankingEntry, RankingPatch};
pub use compare::{align, AlignedRow, AlignedSection, ComparisonTable, TableRow};
pub use envelope::ApiResponse;
pub use error::{DocumentError, ValidationError};
pub use modal::ModalState;
pub use scroll::{
    NavAction, NavigatorConfig, SectionLayout, SectionNavigator, SectionViewport, WheelInput,
};
pub use vehicle::{
    AssetReference, FileRef, ImageRef, Parameter, Partner, SpecSection, Specifications, Vehicle,
    VehicleDraft,
};
