use clavis::{Key, KeyConfig, Record};

fn rule(id: i64, attribute: &str, operator: &str, value: &str, name: &str) -> Record {
    Record::new()
        .set("ID", id)
        .set("ATTRIBUTE", attribute)
        .set("OPERATOR", operator)
        .set("VALUE", value)
        .set("NAME", name)
}

fn edge(input: i64, rules: &str, target: &str, id: i64, name: &str) -> Record {
    Record::new()
        .set("INPUT_COUPLET", input)
        .set("RULES", rules)
        .set(target, id)
        .set("OUTPUT_NAME", name)
}

fn main() {
    // Rule and key tables, as an external loader would supply them.
    let rules = vec![
        rule(1, "GROWTH_FORM", "in", "tree", "Trees present"),
        rule(2, "COVER", ">=", "30", "Cover at least 30%"),
        rule(3, "GROWTH_FORM", "regex", "shrub|heath", "Shrubs present"),
    ];
    let key_rows = vec![
        edge(0, "1", "OUTPUT_COUPLET", 1, "Woody vegetation"),
        edge(0, "not 1 and 3", "OUTPUT_CLASS", 20, "Shrubland"),
        edge(0, "not (1 or 3)", "OUTPUT_CLASS", 30, "Grassland"),
        edge(1, "2", "OUTPUT_CLASS", 10, "Forest"),
        edge(1, "not 2", "OUTPUT_CLASS", 11, "Woodland"),
    ];

    let key = Key::from_rows(
        &rules,
        &key_rows,
        KeyConfig::new("Vegetation key").with_id_field("SITE"),
    )
    .expect("failed to build key");

    println!("{key}");
    for reference in key.undefined_references() {
        println!(
            "warning: edge {} -> {} uses undefined rule {}",
            reference.input, reference.output, reference.rule
        );
    }

    let sites = vec![
        Record::new().set("SITE", "A1").set("GROWTH_FORM", "Tree").set("COVER", 55_i64),
        Record::new().set("SITE", "A2").set("GROWTH_FORM", "tree mallee").set("COVER", 12.5),
        Record::new().set("SITE", "B1").set("GROWTH_FORM", "Heath"),
        Record::new().set("SITE", "C1").set("GROWTH_FORM", "tussock grass"),
        Record::new().set("SITE", "D1").set("GROWTH_FORM", "tree"),
    ];

    for outcome in key.classify_iter(&sites) {
        match outcome {
            Ok(classification) => println!("{classification}"),
            Err(err) => println!("error: {err}"),
        }
    }
}
