use anyhow::Result;
use ecommerce_pipeline::loader::DatasetLoader;
use ecommerce_pipeline::models::SourceTable;
use std::env;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let dir = env::args()
        .nth(1)
        .or_else(|| env::var("ECOM_DATASET_DIR").ok())
        .unwrap_or_else(|| "datasets".to_string());

    let loader = DatasetLoader::new(dir);
    println!(
        "=== INSPECTING DATASETS IN {} ===\n",
        loader.dataset_dir().display()
    );

    for table in SourceTable::ALL {
        let path = loader.path_for(table);
        match loader.load_table(table) {
            Ok(df) => {
                println!("{} ({})", table, path.display());
                println!("   Shape: {} rows x {} columns", df.height(), df.width());
                for column in df.get_columns() {
                    println!(
                        "   - {}: {} ({} nulls)",
                        column.name(),
                        column.dtype(),
                        column.null_count()
                    );
                }
                println!();
            }
            Err(e) => {
                println!("{}: {}\n", table, e);
            }
        }
    }

    Ok(())
}
