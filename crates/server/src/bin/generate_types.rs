//! Run with: cargo run --package server --bin generate-types --features typescript

use std::fs;
use std::path::Path;

fn main() {
    println!("Generating TypeScript types...");

    let out_dir = Path::new("frontend/src/types/generated");

    if let Err(e) = fs::create_dir_all(out_dir) {
        eprintln!("Failed to create output directory: {}", e);
        std::process::exit(1);
    }

    #[cfg(feature = "typescript")]
    {
        use ts_rs::TS;

        attendance_core::ProgressEvent::export_all_to(out_dir)
            .expect("Failed to export ProgressEvent");
        attendance_core::ScrapeOutcome::export_all_to(out_dir)
            .expect("Failed to export ScrapeOutcome");

        events::WireMessage::export_all_to(out_dir).expect("Failed to export WireMessage");
        events::ResultPayload::export_all_to(out_dir).expect("Failed to export ResultPayload");
        events::FaultPayload::export_all_to(out_dir).expect("Failed to export FaultPayload");

        println!("Types exported to {}", out_dir.display());

        generate_index(out_dir);
    }

    #[cfg(not(feature = "typescript"))]
    {
        eprintln!("Error: typescript feature is not enabled");
        eprintln!("Run with: cargo run --package server --bin generate-types --features typescript");
        std::process::exit(1);
    }
}

#[cfg(feature = "typescript")]
fn generate_index(out_dir: &Path) {
    use std::io::Write;

    let index_path = out_dir.join("index.ts");
    let mut file = fs::File::create(&index_path).expect("Failed to create index.ts");

    let exports = r#"// Auto-generated - regenerate with: cargo run --package server --bin generate-types --features typescript

export * from './ProgressEvent';
export * from './ScrapeOutcome';

export * from './WireMessage';
export * from './ResultPayload';
export * from './FaultPayload';
"#;

    file.write_all(exports.as_bytes())
        .expect("Failed to write index.ts");

    println!("Generated {}", index_path.display());
}
