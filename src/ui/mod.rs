//! User-facing response text. Every reply is a single string that starts
//! with a glyph; failures always use [`replies::glyphs::FAILURE`].

pub mod replies;
