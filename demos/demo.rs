use std::io::Write;

use oxyframe::*;

fn print_frame(frame: &Frame) {
    let names = frame.column_names();
    for name in &names {
        print!("{:<10}", name);
    }
    println!();
    println!("{}", "-".repeat(10 * names.len()));

    for row_idx in 0..frame.height() {
        for column in frame.columns() {
            let cell = if column.is_null(row_idx) {
                "NULL".to_string()
            } else {
                column.value_string(row_idx)
            };
            print!("{:<10}", cell);
        }
        println!();
    }
    println!();
}

fn main() -> Result<()> {
    println!("In-Memory Frame Demo\n");

    // Write a small CSV to scan
    let path = std::env::temp_dir().join("oxyframe_demo_users.csv");
    {
        let mut file = std::fs::File::create(&path)?;
        writeln!(file, "id,name,age,active")?;
        writeln!(file, "1,Alice,30,true")?;
        writeln!(file, "2,Bob,NULL,false")?;
        writeln!(file, "3,Charlie,25,t")?;
        writeln!(file, "4,Dana,42,")?;
        writeln!(file, "5,,18,TRUE")?;
    }

    let users = read_csv(&path, &ScanOptions::default())?;
    println!("Loaded {} rows", users.height());
    for def in users.schema().columns {
        println!("  - {}: {}", def.name, def.data_type);
    }
    println!();
    print_frame(&users);

    // Deferred plan: declared sort first, filter is hoisted before it
    let plan = scan_csv(&path, ScanOptions::default())
        .sort("age", true)
        .select(&["name", "age"])
        .filter(col("age").gt(20).and(col("age").even()));

    println!("Declared:");
    for op in plan.operations() {
        println!("  {}", op);
    }
    println!("Optimized:");
    for op in plan.optimized_operations() {
        println!("  {}", op);
    }
    println!();

    let adults = plan.collect()?;
    print_frame(&adults);

    println!("JSON: {}", adults.to_json_rows()?);
    println!("Checksum: {}", adults.projection_checksum(2));

    std::fs::remove_file(&path)?;
    Ok(())
}
