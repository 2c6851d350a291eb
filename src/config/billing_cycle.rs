/// Day-of-month rules of the billing cycle.
///
/// Rows dated inside `[first_day, last_day]` count toward a report, and files in a daily
/// container only count once they were created on or after `daily_cutoff_day`, which is when
/// the cycle enters its second half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingCycle {
    pub first_day: i8,
    pub last_day: i8,
    pub daily_cutoff_day: i8,
}

impl BillingCycle {
    pub fn contains_day(&self, day: i8) -> bool {
        (self.first_day..=self.last_day).contains(&day)
    }
}

impl Default for BillingCycle {
    fn default() -> Self {
        BILLING_CYCLE
    }
}

pub static BILLING_CYCLE: BillingCycle = BillingCycle {
    first_day: 1,
    last_day: 18,
    daily_cutoff_day: 19,
};

/// Header names read from the cost exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostColumns {
    pub cost: &'static str,
    pub date: &'static str,
}

impl Default for CostColumns {
    fn default() -> Self {
        COST_COLUMNS
    }
}

pub static COST_COLUMNS: CostColumns = CostColumns {
    cost: "CostInBillingCurrency",
    date: "Date",
};

/// Header names read from the usage exports that get split per meter.
pub static SUBSCRIPTION_COLUMN: &str = "SubscriptionId";
pub static METER_COLUMN: &str = "MeterId";
pub static USAGE_DATE_COLUMN: &str = "Date";
