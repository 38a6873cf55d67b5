use recipefeed_sdk::actions::{aggregate_ingredients, render_shopping_list};
use recipefeed_sdk::schema::CartIngredientRow;
use recipefeed_sdk::SHOPPING_LIST_HEADER;

fn row(name: &str, unit: &str, amount: i32) -> CartIngredientRow {
    CartIngredientRow {
        name: name.to_string(),
        measurement_unit: unit.to_string(),
        amount,
    }
}

#[test]
fn overlapping_ingredients_collapse_into_one_line() {
    // Two cart recipes both needing salt: one line, summed amount.
    let rows = vec![
        row("Salt", "g", 5),
        row("Potatoes", "kg", 1),
        row("Salt", "g", 3),
    ];

    let content = render_shopping_list(&aggregate_ingredients(&rows));

    let salt_lines: Vec<&str> = content.lines().filter(|l| l.contains("Salt")).collect();
    assert_eq!(salt_lines, vec!["- Salt (g) - 8"]);
    assert!(content.contains("- Potatoes (kg) - 1"));
}

#[test]
fn header_comes_first() {
    let rows = vec![row("Flour", "g", 500)];
    let content = render_shopping_list(&aggregate_ingredients(&rows));

    assert_eq!(content.lines().next(), Some(SHOPPING_LIST_HEADER));
}

#[test]
fn empty_cart_yields_header_and_no_ingredient_lines() {
    let content = render_shopping_list(&aggregate_ingredients(&[]));

    assert_eq!(content.lines().next(), Some(SHOPPING_LIST_HEADER));
    assert_eq!(content.lines().filter(|l| l.starts_with('-')).count(), 0);
}

#[test]
fn totals_can_exceed_the_per_recipe_amount_cap() {
    // Each contribution stays below the validation cap, the sum need not.
    let rows = vec![row("Water", "ml", 9999), row("Water", "ml", 9999)];
    let totals = aggregate_ingredients(&rows);

    assert_eq!(totals[&("Water".to_string(), "ml".to_string())], 19_998);
}
