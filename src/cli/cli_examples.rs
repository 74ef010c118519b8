use super::cli_main::get_user_input;
use crate::Examples::gci_examples::{EXAMPLE_CASE_DIR, gci_examples};
use std::io::{self, Write};

pub fn examples_menu() {
    loop {
        println!("\n=== Examples ===");
        println!("1. RANS GCI, constant refinement ratio");
        println!("2. RANS GCI, non-constant refinement ratio");
        println!("3. LES error separation, three meshes");
        println!("4. LES error separation, five meshes");
        println!("5. Case from files (written to {})", EXAMPLE_CASE_DIR);
        println!("0. Back to main menu");
        print!("Enter your choice: ");
        io::stdout().flush().ok();

        let Some(choice) = get_user_input() else {
            break;
        };
        match choice.trim() {
            "1" => gci_examples(0),
            "2" => gci_examples(1),
            "3" => gci_examples(2),
            "4" => gci_examples(3),
            "5" => gci_examples(4),
            "0" => break,
            _ => println!("Invalid choice. Please try again."),
        }
    }
}
