pub mod gci_examples;
