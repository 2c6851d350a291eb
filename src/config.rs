pub mod billing_cycle;
