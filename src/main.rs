//! # Legend Layout CLI
//!
//! Usage:
//!   legend-layout input.json -o pages.json
//!   echo '{ ... }' | legend-layout
//!   legend-layout --example > legend.json

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_legend_json());
        return ExitCode::SUCCESS;
    }

    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1])
    } else {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map(|_| buf)
    };
    let input = match input {
        Ok(input) => input,
        Err(e) => {
            eprintln!("✗ Failed to read input: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let output_path = args
        .windows(2)
        .find(|w| w[0] == "-o")
        .map(|w| w[1].clone());

    let pages = match legend_layout::render_json(&input) {
        Ok(pages) => pages,
        Err(e) => {
            eprintln!("✗ Failed to render legend: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let json = match serde_json::to_string_pretty(&pages) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("✗ Failed to serialize pages: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(&path, &json) {
                eprintln!("✗ Failed to write {}: {}", path, e);
                return ExitCode::FAILURE;
            }
            eprintln!("✓ Rendered {} page(s) to {}", pages.len(), path);
        }
        None => println!("{}", json),
    }
    ExitCode::SUCCESS
}

fn example_legend_json() -> &'static str {
    r##"{
  "config": {
    "maxWidth": 400,
    "maxHeight": 60,
    "maxColumns": 2,
    "overflow": true,
    "iconMaxHeight": 8,
    "textPadding": "0 2",
    "layerFont": "Helvetica-Bold",
    "classFont": "Helvetica"
  },
  "page": {
    "size": "A4",
    "margin": 36
  },
  "legends": [
    {
      "name": "Roads",
      "classes": [
        { "name": "Motorway", "color": "#e8553a" },
        { "name": "Primary road", "color": "#f4a742" },
        { "name": "Track", "color": "#8c6d46" }
      ]
    },
    {
      "name": "Water",
      "classes": [
        { "name": "River", "color": "#3a7be8" },
        { "name": "Lake", "color": "rgb(120, 170, 230)" }
      ]
    },
    {
      "name": "Land use",
      "classes": [
        { "name": "Forest", "color": "0x2f7d32" },
        { "name": "Farmland", "color": "#d9c77a" },
        { "name": "Residential", "color": "gray" }
      ]
    }
  ]
}
"##
}
