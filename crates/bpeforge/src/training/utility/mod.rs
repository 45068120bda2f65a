//! # Trainer Implementation Utilities

mod pair_span_index;
mod symbol_table;
mod token_span_buffer;

#[doc(inline)]
pub use pair_span_index::{PairCountMap, PairIndexMap, PairSpanIndex};
#[doc(inline)]
pub use symbol_table::SymbolTable;
#[doc(inline)]
pub use token_span_buffer::TokenSpanBuf;
