//! # Pagewright CLI
//!
//! Usage:
//!   pagewright input.json -o output.json
//!   pagewright input.json --render print.html
//!   echo '{ ... }' | pagewright
//!   pagewright --example > plan.json

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_document_json());
        return;
    }

    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1]).unwrap_or_else(|e| fail(&format!("Failed to read {}: {}", args[1], e)))
    } else {
        let mut buf = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut buf) {
            fail(&format!("Failed to read stdin: {}", e));
        }
        buf
    };

    let flag = |name: &str| args.windows(2).find(|w| w[0] == name).map(|w| w[1].clone());
    let output_path = flag("-o");
    let render_path = flag("--render");

    let document: pagewright::DocumentInput = match serde_json::from_str(&input) {
        Ok(doc) => doc,
        Err(e) => fail(&format!("Failed to parse document: {}", pagewright::PagewrightError::from(e))),
    };
    let paginated = match pagewright::paginate_document(&document) {
        Ok(p) => p,
        Err(e) => fail(&format!("Failed to paginate: {}", e)),
    };

    let json = match serde_json::to_string_pretty(&paginated.output) {
        Ok(json) => json,
        Err(e) => fail(&format!("Failed to serialize output: {}", e)),
    };
    match &output_path {
        Some(path) => {
            write_or_fail(path, &json);
            eprintln!(
                "✓ {} pages written to {}",
                paginated.output.pages.len(),
                path
            );
        }
        None => println!("{}", json),
    }

    if let Some(path) = &render_path {
        write_or_fail(path, &paginated.print_html);
        eprintln!("✓ Print HTML written to {}", path);
    }
}

fn write_or_fail(path: &str, contents: &str) {
    if let Err(e) = fs::write(path, contents) {
        fail(&format!("Failed to write {}: {}", path, e));
    }
}

fn fail(message: &str) -> ! {
    eprintln!("✗ {}", message);
    process::exit(1);
}

fn example_document_json() -> &'static str {
    r##"{
  "pages": [
    "<h2 style=\"text-align: center\">ACTIVITY PLAN</h2><p><b>Organization:</b> Computer Science Society</p><p><b>Title of Activity:</b> Intramural Programming Contest</p><p><b>Date and Venue:</b> March 14, 2026, Engineering Hall</p><h3>I. Rationale</h3><p>The contest gives members a venue to practice algorithmic problem solving under time pressure and to meet peers from other year levels.</p><h3>II. Objectives</h3><ol><li>Encourage participation in competitive programming.</li><li>Select representatives for the regional contest.</li></ol><h3>III. Program Flow</h3><table><tr><th>Time</th><th>Activity</th><th>Person in Charge</th></tr><tr><td>8:00 AM</td><td>Registration</td><td>Secretary</td></tr><tr><td>9:00 AM</td><td>Contest proper</td><td>Contest chair</td></tr><tr><td>2:00 PM</td><td>Awarding</td><td>President</td></tr></table>"
  ],
  "config": {
    "pageSize": "A4",
    "letterhead": {
      "institution": "State University",
      "office": "Office of Student Affairs"
    }
  },
  "members": [
    { "name": "Ana Cruz", "role": "President" },
    { "name": "Ben Reyes", "role": "Secretary" }
  ],
  "signatories": {
    "Prepared by:": [{ "name": "Ben Reyes", "position": "Secretary" }],
    "Noted by:": [{ "name": "Dr. Carla Santos", "position": "Adviser" }],
    "Approved by:": [{ "name": "Dean Luis Garcia", "position": "Dean of Student Affairs" }]
  }
}"##
}
