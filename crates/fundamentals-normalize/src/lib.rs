#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fundamentals/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Label normalization and token similarity.
pub mod fuzzy;
/// The label normalizer.
pub mod normalizer;
/// Synonym table.
pub mod synonyms;

pub use fuzzy::{FUZZY_THRESHOLD, TOKEN_SIMILARITY, normalize_label, score, tokens};
pub use normalizer::{LabelMatch, LabelNormalizer, NormalizedItems};
pub use synonyms::SYNONYMS;
