/*!
 * # pagelingo
 *
 * A Rust library for translating the human-readable text of HTML documents
 * while preserving markup structure, reconciling disagreeing
 * machine-translation outputs into a single chosen text per fragment.
 *
 * ## Features
 *
 * - Extract translatable text nodes and attribute values behind
 *   order-preserving placeholder markers
 * - Query independent translation backends per fragment with
 *   backend-specific retry policies
 * - Reconcile candidate translations through arbitration or a deterministic
 *   fallback chain
 * - Merge final texts back into the exact document skeleton, marking
 *   unresolvable fragments visibly instead of dropping them
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `extractor`: Document parsing and unit extraction
 * - `providers`: Client implementations for the translation backends:
 *   - `providers::pool`: Best-effort endpoint pool (LibreTranslate wire format)
 *   - `providers::keyed`: Keyed single-endpoint API (DeepL wire format)
 *   - `providers::arbiter`: LLM arbitration (OpenAI chat-completions wire format)
 * - `resolver`: Reconciliation of provider outputs
 * - `pipeline`: Orchestration of extract, fan-out, collect, and merge
 * - `merge`: Placeholder substitution into the final document
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod extractor;
pub mod language_utils;
pub mod merge;
pub mod pipeline;
pub mod providers;
pub mod resolver;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, ExtractionError, ProviderError, ResolutionError};
pub use extractor::{ExtractedDocument, TranslatableUnit, UnitContext, UnitKind};
pub use merge::FAILURE_SENTINEL;
pub use pipeline::TranslationPipeline;
pub use resolver::{Provenance, ResolvedTranslation, Resolver};
