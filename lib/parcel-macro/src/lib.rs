//! Derive macros for the parcel HTTP client.
//!
//! - `#[derive(Record)]` on a struct with named fields implements
//!   `parcel::Record` and `parcel::ToWire`, so the struct can be sent as a
//!   JSON body, a query string or a multipart form, and nested in other
//!   records.
//! - `#[derive(Record)]` on an enum with unit variants implements
//!   `parcel::ToWire`, encoding each variant as its (renamed) name, or as
//!   its discriminant when every variant declares one.
//!
//! # Example
//!
//! ```ignore
//! use parcel::prelude::*;
//!
//! #[derive(Record)]
//! #[record(rename_all = "camelCase")]
//! struct CreateUser {
//!     display_name: String,          // "displayName"
//!     #[record(rename = "mail")]
//!     email: Option<String>,         // "mail", omitted when None
//!     #[record(skip)]
//!     local_only: bool,
//!     avatar: Option<MultipartFile>, // file part in a multipart form
//! }
//! ```

mod record_derive;
mod rename;

use proc_macro::TokenStream;

/// Derive `Record` (structs) or `ToWire` (unit enums).
///
/// # Container Attributes
///
/// - `#[record(rename_all = "camelCase")]` - Rename all fields or variants
/// - `#[record(emit_nulls)]` - Keep `None` fields as explicit nulls (structs only)
///
/// Supported case conventions:
/// - `lowercase`, `UPPERCASE`
/// - `camelCase`, `PascalCase`
/// - `snake_case`, `SCREAMING_SNAKE_CASE`
/// - `kebab-case`, `SCREAMING-KEBAB-CASE`
///
/// # Field Attributes
///
/// - `#[record(rename = "name")]` - Wire key for the field (overrides `rename_all`)
/// - `#[record(skip)]` - Never encode the field
/// - `#[record(display)]` - Encode the field through its `Display` impl
///
/// # Variant Attributes
///
/// - `#[record(rename = "name")]` - Wire string for the variant
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record_derive::expand_record_derive(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
