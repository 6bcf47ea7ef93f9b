//! CSV rendering of the aggregated shopping list.

use std::borrow::Cow;
use std::fmt::Write;

use crate::models::recipe::ShoppingListItem;

pub const CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const CONTENT_DISPOSITION: &str = "attachment; filename=\"Shoppinglist.csv\"";

const UTF8_BOM: &str = "\u{feff}";

/// BOM followed by one `name,unit,total` row per item, CRLF-terminated.
#[must_use]
pub fn render_csv(items: &[ShoppingListItem]) -> Vec<u8> {
    let mut csv = String::from(UTF8_BOM);
    for item in items {
        let _ = write!(
            csv,
            "{},{},{}\r\n",
            quote(&item.name),
            quote(&item.measurement_unit),
            item.total_amount
        );
    }
    csv.into_bytes()
}

fn quote(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, unit: &str, total: i64) -> ShoppingListItem {
        ShoppingListItem {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            total_amount: total,
        }
    }

    #[test]
    fn test_render_starts_with_bom() {
        let bytes = render_csv(&[item("flour", "g", 150)]);
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        assert_eq!(&bytes[3..], b"flour,g,150\r\n");
    }

    #[test]
    fn test_render_empty_list_is_only_bom() {
        assert_eq!(render_csv(&[]), UTF8_BOM.as_bytes());
    }

    #[test]
    fn test_fields_with_separators_are_quoted() {
        let bytes = render_csv(&[item("salt, sea", "pinch \"big\"", 2)]);
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text.trim_start_matches(UTF8_BOM),
            "\"salt, sea\",\"pinch \"\"big\"\"\",2\r\n"
        );
    }
}
