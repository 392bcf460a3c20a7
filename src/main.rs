use minirel::index::BTree;
use minirel::record::{Attribute, Expr, Record, Schema, Table, Value};
use minirel::DataType;

fn main() {
    env_logger::init();

    println!("minirel - a page-based storage engine");
    println!("=====================================\n");

    let table_path = "demo.tbl";
    let index_path = "demo.idx";

    let schema = Schema::new(
        vec![
            Attribute::new("id", DataType::Int, 0).expect("attribute"),
            Attribute::new("name", DataType::String, 8).expect("attribute"),
        ],
        vec![0],
    )
    .expect("schema");

    Table::create(table_path, &schema).expect("failed to create table");
    let table = Table::open(table_path).expect("failed to open table");
    println!("Created table at {table_path}");

    let people = [(1, "ada"), (2, "edgar"), (3, "grace")];
    let mut rids = Vec::new();

    for (id, name) in people {
        let mut record = Record::new(table.schema());
        record
            .set_attr(table.schema(), 0, &Value::Int(id))
            .expect("set id");
        record
            .set_attr(table.schema(), 1, &Value::String(name.into()))
            .expect("set name");
        let rid = table.insert(&mut record).expect("insert");
        println!("Inserted ({id}, {name}) at {rid}");
        rids.push((id, rid));
    }

    // scan for everyone after the first id
    let predicate = Expr::gt(Expr::attr(0), Expr::constant(Value::Int(1)));
    let mut scan = table.scan(predicate);
    println!("\nRecords with id > 1:");
    while let Ok(record) = scan.next() {
        let id = record.get_attr(table.schema(), 0).expect("id");
        let name = record.get_attr(table.schema(), 1).expect("name");
        println!("  {id} -> {name}");
    }

    // mirror the ids into an index and walk it in order
    BTree::create(index_path, DataType::Int, 2).expect("failed to create index");
    let index = BTree::open(index_path).expect("failed to open index");
    for (id, rid) in &rids {
        index.insert(*id, *rid).expect("index insert");
    }

    println!("\nIndex scan in key order:");
    let mut tree_scan = index.scan().expect("open scan");
    while let Ok(rid) = tree_scan.next_entry() {
        println!("  {rid}");
    }
    drop(tree_scan);

    index.close().expect("close index");
    table.close().expect("close table");

    Table::destroy(table_path).expect("remove table file");
    BTree::destroy(index_path).expect("remove index file");
    println!("\nDone.");
}
