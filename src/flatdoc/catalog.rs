//! Built-in record types of the energy model.
//!
//! | Type      | Directory   | Ext   | Variants                                               |
//! |-----------|-------------|-------|--------------------------------------------------------|
//! | `node`    | `nodes`     | `ad`  | converter, demand, final_demand, primary               |
//! | `edge`    | `edges`     | `ad`  | share, flexible, constant, dependent, inversed_flexible |
//! | `carrier` | `carriers`  | `ad`  |                                                        |
//! | `dataset` | `datasets`  | `ad`  |                                                        |
//! | `gquery`  | `gqueries`  | `gql` |                                                        |

use crate::schema::{DocumentType, FieldDefault, FieldKind, FieldSpec, Schema, Variant};

use FieldKind::{Bool, Float, Int, List, Map, Str};

static NODE_SCHEMA: Schema = Schema {
    name: "node",
    fields: &[
        FieldSpec::new("sector", Str),
        FieldSpec::new("use", Str),
        FieldSpec::new("energy_balance_group", Str),
        FieldSpec::new("groups", List),
        FieldSpec::new("input", Map),
        FieldSpec::new("output", Map),
        FieldSpec::new("demand", Float),
        FieldSpec::new("max_demand", Float),
        FieldSpec::new("free_co2_factor", Float),
        FieldSpec::new("has_loss", Bool),
    ],
    parent: None,
};

static CONVERTER_NODE_SCHEMA: Schema = Schema {
    name: "converter_node",
    fields: &[
        FieldSpec::new("full_load_hours", Float),
        FieldSpec::new("number_of_units", Float),
        FieldSpec::new("electricity_output_capacity", Float),
    ],
    parent: Some(&NODE_SCHEMA),
};

static DEMAND_NODE_SCHEMA: Schema = Schema {
    name: "demand_node",
    fields: &[FieldSpec::new("demand_expected", Bool)],
    parent: Some(&NODE_SCHEMA),
};

static FINAL_DEMAND_NODE_SCHEMA: Schema = Schema {
    name: "final_demand_node",
    fields: &[FieldSpec::new("demand_expected", Bool)],
    parent: Some(&NODE_SCHEMA),
};

static PRIMARY_NODE_SCHEMA: Schema = Schema {
    name: "primary_node",
    fields: &[FieldSpec::new("sustainability_share", Float)],
    parent: Some(&NODE_SCHEMA),
};

pub static NODE: DocumentType = DocumentType {
    name: "node",
    directory: "nodes",
    extension: "ad",
    schema: &NODE_SCHEMA,
    variants: &[
        Variant {
            suffix: "converter",
            schema: &CONVERTER_NODE_SCHEMA,
        },
        Variant {
            suffix: "demand",
            schema: &DEMAND_NODE_SCHEMA,
        },
        Variant {
            suffix: "final_demand",
            schema: &FINAL_DEMAND_NODE_SCHEMA,
        },
        Variant {
            suffix: "primary",
            schema: &PRIMARY_NODE_SCHEMA,
        },
    ],
};

static EDGE_SCHEMA: Schema = Schema {
    name: "edge",
    fields: &[
        FieldSpec::new("carrier", Str),
        FieldSpec::new("child_share", Float),
        FieldSpec::new("parent_share", Float),
        FieldSpec::new("demand", Float),
        FieldSpec::new("reversed", Bool),
        FieldSpec::new("priority", Int),
        FieldSpec::new("groups", List),
    ],
    parent: None,
};

pub static EDGE: DocumentType = DocumentType {
    name: "edge",
    directory: "edges",
    extension: "ad",
    schema: &EDGE_SCHEMA,
    variants: &[
        Variant {
            suffix: "share",
            schema: &EDGE_SCHEMA,
        },
        Variant {
            suffix: "flexible",
            schema: &EDGE_SCHEMA,
        },
        Variant {
            suffix: "constant",
            schema: &EDGE_SCHEMA,
        },
        Variant {
            suffix: "dependent",
            schema: &EDGE_SCHEMA,
        },
        Variant {
            suffix: "inversed_flexible",
            schema: &EDGE_SCHEMA,
        },
    ],
};

static CARRIER_SCHEMA: Schema = Schema {
    name: "carrier",
    fields: &[
        FieldSpec::new("co2_conversion_per_mj", Float),
        FieldSpec::new("cost_per_mj", Float),
        FieldSpec::new("sustainable", Float),
        FieldSpec::new("infinite", Bool),
        FieldSpec::new("graphviz_color", Str),
    ],
    parent: None,
};

pub static CARRIER: DocumentType = DocumentType {
    name: "carrier",
    directory: "carriers",
    extension: "ad",
    schema: &CARRIER_SCHEMA,
    variants: &[],
};

static DATASET_SCHEMA: Schema = Schema {
    name: "dataset",
    fields: &[
        FieldSpec::new("area", Str),
        FieldSpec::new("base_dataset", Str),
        FieldSpec::new("group", Str),
        FieldSpec::new("analysis_year", Int).with_default(FieldDefault::Int(2019)),
        FieldSpec::new("number_of_residences", Float),
        FieldSpec::new("enabled", Map),
        FieldSpec::new("has_industry", Bool).with_default(FieldDefault::Bool(true)),
    ],
    parent: None,
};

pub static DATASET: DocumentType = DocumentType {
    name: "dataset",
    directory: "datasets",
    extension: "ad",
    schema: &DATASET_SCHEMA,
    variants: &[],
};

static GQUERY_SCHEMA: Schema = Schema {
    name: "gquery",
    fields: &[
        FieldSpec::new("description", Str),
        FieldSpec::new("unit", Str),
        FieldSpec::new("deprecated_key", Str),
        FieldSpec::new("labels", List),
    ],
    parent: None,
};

pub static GQUERY: DocumentType = DocumentType {
    name: "gquery",
    directory: "gqueries",
    extension: "gql",
    schema: &GQUERY_SCHEMA,
    variants: &[],
};

/// Every built-in type, in dependency order (carriers before the edges that
/// reference them).
pub static ALL: &[&DocumentType] = &[&CARRIER, &NODE, &EDGE, &DATASET, &GQUERY];

/// Looks a type up by name (`node`) or directory (`nodes`).
pub fn find(name: &str) -> Option<&'static DocumentType> {
    ALL.iter()
        .copied()
        .find(|t| t.name == name || t.directory == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_by_name_or_directory() {
        assert_eq!(find("node").unwrap().name, "node");
        assert_eq!(find("gqueries").unwrap().extension, "gql");
        assert!(find("widgets").is_none());
    }

    #[test]
    fn variant_schemas_extend_the_base() {
        let converter = NODE.variant("converter").unwrap();
        assert!(converter.schema.field("full_load_hours").is_some());
        assert!(converter.schema.field("sector").is_some());
        assert!(NODE.schema.field("full_load_hours").is_none());
    }

    #[test]
    fn file_names() {
        let converter = NODE.variant("converter");
        assert_eq!(NODE.file_name("coal", converter), "coal.converter.ad");
        assert_eq!(GQUERY.file_name("total", None), "total.gql");
    }
}
