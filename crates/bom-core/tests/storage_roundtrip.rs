use bom_core::aggregate::RawRequirement;
use bom_core::explode::Explosion;
use bom_core::graph::MaterialType;
use bom_core::storage;
use std::fs;
use tempfile::TempDir;

const MATERIALS_CSV: &str = "\
MaterialNumber,MaterialType,MaterialName,ProductComplexity
FG1,FG,Bosch Gearbox,MED
SFG1,SFG,Denso Crankshaft,LOW
SFG2,SFG,TRW Caliper,HIGH
RAW1,RAW,OEM Bearing,LOW
RAW2,RAW,HD Seal,LOW
";

const BOM_CSV: &str = "\
ParentMaterial,ComponentMaterial,Quantity,Level
FG1,SFG1,2,1
FG1,SFG2,1,1
SFG1,RAW1,3,2
SFG1,RAW2,1,2
SFG2,RAW1,5,2
";

#[test]
fn test_load_graph_from_csv_tables() {
    let tmp = TempDir::new().unwrap();
    let materials = tmp.path().join("material_master.csv");
    let edges = tmp.path().join("bom_table.csv");
    fs::write(&materials, MATERIALS_CSV).unwrap();
    fs::write(&edges, BOM_CSV).unwrap();

    let graph = storage::load_graph(&edges, &materials).unwrap();
    assert_eq!(graph.metadata().total_materials, 5);
    assert_eq!(graph.metadata().total_edges, 5);
    assert_eq!(
        graph.material("FG1").unwrap().material_type,
        Some(MaterialType::Fg)
    );
    assert_eq!(
        graph.material("SFG2").unwrap().name.as_deref(),
        Some("TRW Caliper")
    );

    let rows = Explosion::new(&graph).resolve("FG1").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].total_qty, 11);
    assert_eq!(rows[1].total_qty, 2);
}

#[test]
fn test_load_graph_from_json_tables() {
    let tmp = TempDir::new().unwrap();
    let materials = tmp.path().join("materials.json");
    let edges = tmp.path().join("edges.json");
    fs::write(
        &materials,
        r#"[
            {"MaterialNumber": "FG1", "MaterialType": "FG"},
            {"MaterialNumber": "RAW1"}
        ]"#,
    )
    .unwrap();
    fs::write(
        &edges,
        r#"[{"ParentMaterial": "FG1", "ComponentMaterial": "RAW1", "Quantity": 4}]"#,
    )
    .unwrap();

    let graph = storage::load_graph(&edges, &materials).unwrap();
    assert_eq!(graph.material("RAW1").unwrap().material_type, None);
    let rows = Explosion::new(&graph).resolve("FG1").unwrap();
    assert_eq!(
        rows,
        vec![RawRequirement {
            raw_material: "RAW1".into(),
            total_qty: 4
        }]
    );
}

#[test]
fn test_csv_with_empty_type_column() {
    let tmp = TempDir::new().unwrap();
    let materials = tmp.path().join("m.csv");
    fs::write(&materials, "MaterialNumber,MaterialType\nX1,\nX2,RAW\n").unwrap();

    let loaded = storage::load_materials(&materials).unwrap();
    assert_eq!(loaded[0].material_type, None);
    assert_eq!(loaded[1].material_type, Some(MaterialType::Raw));
}

#[test]
fn test_csv_type_column_is_case_insensitive() {
    let tmp = TempDir::new().unwrap();
    let materials = tmp.path().join("m.csv");
    fs::write(&materials, "MaterialNumber,MaterialType\nX1,raw\nX2, Sfg \nX3,fg\n").unwrap();

    let loaded = storage::load_materials(&materials).unwrap();
    let types: Vec<_> = loaded.iter().map(|m| m.material_type).collect();
    assert_eq!(
        types,
        vec![
            Some(MaterialType::Raw),
            Some(MaterialType::Sfg),
            Some(MaterialType::Fg)
        ]
    );
}

#[test]
fn test_csv_unknown_type_is_malformed_row() {
    let tmp = TempDir::new().unwrap();
    let materials = tmp.path().join("m.csv");
    fs::write(&materials, "MaterialNumber,MaterialType\nX1,RAW\nX2,widget\n").unwrap();

    let msg = format!("{:#}", storage::load_materials(&materials).unwrap_err());
    assert!(msg.contains("malformed row 3"), "{msg}");
}

#[test]
fn test_invalid_rows_surface_every_problem() {
    let tmp = TempDir::new().unwrap();
    let materials = tmp.path().join("m.csv");
    let edges = tmp.path().join("e.csv");
    fs::write(&materials, MATERIALS_CSV).unwrap();
    fs::write(
        &edges,
        "ParentMaterial,ComponentMaterial,Quantity\nRAW1,RAW1,1\nFG1,SFG9,2\nSFG1,RAW2,0\n",
    )
    .unwrap();

    let err = storage::load_graph(&edges, &materials).unwrap_err();
    let load_err = err
        .downcast_ref::<bom_core::error::LoadError>()
        .expect("load error in chain");
    assert_eq!(load_err.problems().len(), 3);
    assert!(format!("{err:#}").contains("RAW1 -> RAW1"));
}

#[test]
fn test_malformed_quantity_names_file_and_row() {
    let tmp = TempDir::new().unwrap();
    let edges = tmp.path().join("e.csv");
    fs::write(
        &edges,
        "ParentMaterial,ComponentMaterial,Quantity\nFG1,RAW1,2\nFG1,RAW2,lots\n",
    )
    .unwrap();

    let err = storage::load_edges(&edges).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("malformed row 3"), "{msg}");
    assert!(msg.contains("e.csv"), "{msg}");
}

#[test]
fn test_missing_file_is_error() {
    let tmp = TempDir::new().unwrap();
    assert!(storage::load_edges(&tmp.path().join("absent.csv")).is_err());
    assert!(storage::load_materials(&tmp.path().join("absent.json")).is_err());
}

#[test]
fn test_load_orders_ignores_extra_columns() {
    let tmp = TempDir::new().unwrap();
    let orders = tmp.path().join("production_orders.csv");
    fs::write(
        &orders,
        "ProductionOrderID,MaterialNumber,MaterialName,PlannedQty,PlantID\n\
         PO100000,FG1,Bosch Gearbox,25,PLT1\n\
         PO100001,FG1,Bosch Gearbox,10,PLT2\n",
    )
    .unwrap();

    let loaded = storage::load_orders(&orders).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].order_id.as_deref(), Some("PO100000"));
    assert_eq!(loaded[1].planned_qty, 10);
}

#[test]
fn test_save_requirements_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let rows = vec![
        RawRequirement {
            raw_material: "RAW1".into(),
            total_qty: 11,
        },
        RawRequirement {
            raw_material: "RAW2".into(),
            total_qty: 2,
        },
    ];

    let json_path = tmp.path().join("req.json");
    storage::save_requirements(&json_path, &rows).unwrap();
    let back: Vec<RawRequirement> =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(back, rows);

    let csv_path = tmp.path().join("req.csv");
    storage::save_requirements(&csv_path, &rows).unwrap();
    assert_eq!(
        fs::read_to_string(&csv_path).unwrap(),
        "RawMaterial,TotalQty\nRAW1,11\nRAW2,2\n"
    );
}
