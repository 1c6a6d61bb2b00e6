// SPDX-License-Identifier: MIT

//! Shopping-list aggregation.
//!
//! Amounts are summed per (ingredient name, measurement unit) key, so the
//! same name with different units stays separate while distinct ingredient
//! records sharing name and unit merge into one line.

use crate::models::ShoppingListRow;

/// Render the consolidated shopping list as a plain-text document.
///
/// Entries keep first-encountered order; an empty cart yields the header
/// line only.
pub fn render_shopping_list(rows: &[ShoppingListRow]) -> String {
    let mut entries: Vec<((String, String), i64)> = Vec::new();

    for row in rows {
        let existing = entries
            .iter_mut()
            .find(|((name, unit), _)| *name == row.name && *unit == row.measurement_unit);
        match existing {
            Some((_, amount)) => *amount += row.amount,
            None => entries.push((
                (row.name.clone(), row.measurement_unit.clone()),
                row.amount,
            )),
        }
    }

    let mut lines = vec!["Список покупок:".to_string()];
    for ((name, unit), amount) in entries {
        lines.push(format!("- {name} ({unit}) — {amount}"));
    }
    lines.join("\n")
}
