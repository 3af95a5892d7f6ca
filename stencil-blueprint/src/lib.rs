//! # stencil-blueprint
//!
//! Pure text transforms between generated artifacts and blueprint literals.
//!
//! - [`extract`] — the structural extractor: finds `name = {...}` and
//!   `name = """..."""` definitions by delimiter scanning, never by parsing.
//! - [`literal`] — turns raw artifact text into an escaped literal with
//!   parameter values replaced by `{placeholder}` tokens, and back.
//!
//! ```rust
//! use stencil_blueprint::{extract, literal};
//! use stencil_core::ParameterSet;
//!
//! let params: ParameterSet = [("packName", "demo")].into_iter().collect();
//! let lit = literal::literalize("import demo\n", &params);
//! assert_eq!(lit, "import {packName}\n");
//!
//! let container = format!("check_blueprint = \"\"\"{lit}\"\"\"\n");
//! let span = extract::extract(&container, "check_blueprint").unwrap();
//! assert_eq!(span.body_text(&container), lit);
//! ```

pub mod error;
pub mod extract;
pub mod literal;

pub use error::BlueprintError;
pub use extract::{extract, scan, BodyStyle, DefinitionSpan, Quote};
pub use literal::{expand, literalize};
