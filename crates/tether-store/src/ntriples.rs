//! N-Triples rendering of a store's contents.
//!
//! Output is sorted so two stores holding the same triples dump
//! byte-identical text (blank node labels aside).

use std::io::Write;

use tether_types::Triple;

use crate::error::StoreResult;
use crate::traits::TripleStore;

/// Write every visible triple as one N-Triples line. Returns the line count.
pub fn write_ntriples<W: Write>(store: &dyn TripleStore, mut writer: W) -> StoreResult<usize> {
    let mut triples = store.match_triples(&Triple::any())?;
    triples.sort();
    for triple in &triples {
        writeln!(writer, "{triple}")?;
    }
    writer.flush()?;
    Ok(triples.len())
}

/// Render every visible triple into a string.
pub fn to_ntriples_string(store: &dyn TripleStore) -> StoreResult<String> {
    let mut buf = Vec::new();
    write_ntriples(store, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
