//! Extraction prompt for reading DESIGNED APPURTENANCE LOADING tables.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the extraction rules (e.g. the
//!    quantity-in-parentheses convention) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the prompt directly without
//!    spinning up a real VLM, making prompt regressions easy to catch.
//!
//! Callers can override the default via
//! [`crate::config::ExtractionConfig::prompt`]; the constant here is used
//! only when no override is provided.

/// Default system prompt for extracting an appurtenance-loading table image.
///
/// Used when `ExtractionConfig::prompt` is `None`.
pub const DEFAULT_EXTRACTION_PROMPT: &str = r#"You are a highly accurate document parser. Your task is to extract every single row from the table labeled "DESIGNED APPURTENANCE LOADING" in the provided image. The table uses either a one-column or a two-column layout, where each column contains two subcolumns labeled:
- TYPE
- ELEVATION

Entries typically list antennas, mounts, or similar equipment, with optional carrier or quantity information embedded in parentheses.

Follow these rules precisely:

1. COVERAGE
   - Extract ALL rows, row by row, without missing a single entry.
   - In a two-column layout, extract the entire left column first, then the
     entire right column.
   - Treat each TYPE/ELEVATION pair as one unique item. If either value is
     missing, skip that row.

2. FIELD EXTRACTION (from the TYPE column)
   - Qty: if TYPE starts with a number in parentheses, like "(2)", that number
     is the quantity. If absent, default Qty = 1.
   - Type: the core description with all parenthesised parts removed, e.g.
     the equipment model name.
   - Carrier: if the TYPE string ends with a name in parentheses (like
     "(Verizon)"), that is the carrier or note. If absent, return null.

3. ELEVATION
   - Take the value exactly as shown and convert it to an integer when
     possible (e.g. "195" becomes 195). If unclear or missing, return null.

4. FIDELITY
   - Do NOT merge, reorder, or summarize rows.
   - Do NOT infer or assume values.
   - If a value cannot be determined from the image, return null.
   - Clean Type and Carrier of parentheses; otherwise extract text exactly
     as shown.

5. OUTPUT FORMAT
   Return a valid JSON list, one object per row:

   [
     {
       "Serial": 1,
       "Qty": 2,
       "Type": "Commscope NHH-65C-R2B w/MP",
       "Carrier": "Verizon",
       "Elevation": 195
     },
     {
       "Serial": 2,
       "Qty": 1,
       "Type": "Raycap DC-12 Surge Suppressor",
       "Carrier": null,
       "Elevation": 175
     }
   ]

   Output ONLY valid JSON. Do NOT include explanations, comments, or markdown
   fences. If no valid rows are found, return an empty list: []"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_demands_json_only() {
        assert!(DEFAULT_EXTRACTION_PROMPT.contains("ONLY valid JSON"));
        assert!(DEFAULT_EXTRACTION_PROMPT.contains("empty list"));
    }

    #[test]
    fn prompt_covers_field_conventions() {
        for field in ["Qty", "Type", "Carrier", "Elevation", "Serial"] {
            assert!(
                DEFAULT_EXTRACTION_PROMPT.contains(field),
                "prompt missing field {field}"
            );
        }
    }
}
