//! Metric catalog: every output column of the metrics table.
//!
//! Base metrics are copied from one call-report field each. Derived metrics
//! are computed by the calculator. Each metric carries a display name, a
//! definition prefixed with its period basis and unit, and a flag saying
//! whether it is a dollar amount.

use peerbank_core::domain::FieldCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output metric identifier. Declaration order is catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    // Balances
    TotalAssets,
    TotalDeposits,
    TotalLoans,
    NetLoans,
    TotalSecurities,
    // Loan categories
    RealEstateLoans,
    ResidentialLoans,
    Multifamily,
    FarmlandLoans,
    NonresidentialLoans,
    OwnerOccupiedNonresidential,
    NonOwnerOccupiedNonresidential,
    ConstructionLoans,
    FamilyConstructionLoans,
    OtherConstructionLoans,
    CreNotSecuredByRe,
    CommercialIndustrialLoans,
    AgricultureLoans,
    CreditCards,
    ConsumerLoans,
    // Allowance, past due, capital, income
    AllowanceForCreditLoss,
    PastDue30To89,
    PastDue90Plus,
    Tier1Capital,
    TotalChargeOffs,
    TotalRecoveries,
    NetChargeOffsQuarterly,
    NetIncome,
    Cet1BeforeAdjustments,
    BankEquityCapital,
    PerpetualPreferredStock,
    // Regulator-supplied ratios
    NetInterestMargin,
    EarningAssetsToAssets,
    NonperformingToAssets,
    PastDue30To89Ratio,
    PastDue90PlusRatio,
    NetChargeOffRatio,
    EarningsCoverage,
    ProvisionToChargeOffs,
    AllowanceToLoans,
    AllowanceToNoncurrent,
    NoncurrentLoansRatio,
    NetLoansToDeposits,
    NetLoansToAssets,
    ReturnOnAssets,
    ReturnOnEquity,
    LeverageRatio,
    TotalRiskBasedCapitalRatio,
    EfficiencyRatio,
    // Derived
    CeclTransitionAmount,
    RealEstateToCapital,
    ConstructionToCapital,
    CommercialReToCapital,
    NonOwnerOccupiedCreGrowth3y,
    CiToCapital,
    AgricultureToCapital,
    CreditCardsToCapital,
    NetChargeOffsToAllowance,
}

/// Where a metric's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSource {
    /// Copied from a call-report field with zero-default coercion.
    Field(FieldCode),
    /// Computed by the calculator; may be null.
    Derived,
}

/// Static description of one metric.
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    pub metric: Metric,
    pub name: &'static str,
    pub source: MetricSource,
    pub dollar: bool,
    pub definition: &'static str,
}

pub const METRIC_COUNT: usize = 58;

macro_rules! metric {
    ($m:ident, $name:literal, field $code:ident, $dollar:literal, $def:literal) => {
        MetricSpec {
            metric: Metric::$m,
            name: $name,
            source: MetricSource::Field(FieldCode::$code),
            dollar: $dollar,
            definition: $def,
        }
    };
    ($m:ident, $name:literal, derived, $dollar:literal, $def:literal) => {
        MetricSpec {
            metric: Metric::$m,
            name: $name,
            source: MetricSource::Derived,
            dollar: $dollar,
            definition: $def,
        }
    };
}

/// The catalog, indexed by `Metric as usize`.
pub static CATALOG: [MetricSpec; METRIC_COUNT] = [
    metric!(TotalAssets, "Total Assets", field Asset, true,
        "(YTD, $) The sum of all assets owned by the entity."),
    metric!(TotalDeposits, "Total Deposits", field Dep, true,
        "(YTD, $) The sum of all deposits including demand, savings, and time deposits."),
    metric!(TotalLoans, "Total Loans and Leases", field Lnlsgr, true,
        "(YTD, $) Total loans and lease financing receivables."),
    metric!(NetLoans, "Net Loans and Leases", field Lnlsnet, true,
        "(YTD, $) Loans and leases net of unearned income and allowance."),
    metric!(TotalSecurities, "Total Securities", field Sc, true,
        "(YTD, $) Sum of held-to-maturity, available-for-sale, and equity securities."),
    metric!(RealEstateLoans, "Real Estate Loans", field Lnre, true,
        "(YTD, $) Loans primarily secured by real estate."),
    metric!(ResidentialLoans, "Loans to Residential Properties", field Lnreres, true,
        "(YTD, $) Total loans for residential properties."),
    metric!(Multifamily, "Multifamily", field Lnremult, true,
        "(YTD, $) Loans for multifamily residential properties."),
    metric!(FarmlandLoans, "Farmland Real Estate Loans", field Lnreag, true,
        "(YTD, $) Loans secured by farmland."),
    metric!(NonresidentialLoans, "Loans to Nonresidential Properties", field Lnrenres, true,
        "(YTD, $) Total loans for nonresidential properties."),
    metric!(OwnerOccupiedNonresidential, "Owner-Occupied Nonresidential Properties Loans", field Lnrenrow, true,
        "(YTD, $) Loans for owner-occupied nonresidential properties."),
    metric!(NonOwnerOccupiedNonresidential, "Non-OOC Nonresidential Properties Loans", field Lnrenrot, true,
        "(YTD, $) Loans for non-owner-occupied nonresidential properties."),
    metric!(ConstructionLoans, "RE Construction and Land Development", field Lnrecons, true,
        "(YTD, $) Real estate construction and land development loans."),
    metric!(FamilyConstructionLoans, "1-4 Family Residential Construction and Land Development Loans", field Lnrecnfm, true,
        "(YTD, $) Construction and land development loans for 1-4 family residential properties."),
    metric!(OtherConstructionLoans, "Other Construction, All Land Development and Other Land Loans", field Lnrecnot, true,
        "(YTD, $) Other construction loans, all land development and other land loans."),
    metric!(CreNotSecuredByRe, "Commercial Real Estate Loans not Secured by Real Estate", field Lncomre, true,
        "(YTD, $) Commercial real estate loans that are not secured by real estate."),
    metric!(CommercialIndustrialLoans, "Commercial and Industrial Loans", field Lnci, true,
        "(YTD, $) Loans for commercial and industrial purposes, excluding real estate-secured loans."),
    metric!(AgricultureLoans, "Agriculture Loans", field Lnag, true,
        "(YTD, $) Loans to finance agricultural production and other loans to farmers."),
    metric!(CreditCards, "Credit Cards", field Lncrcd, true,
        "(YTD, $) Consumer loans extended through credit card plans."),
    metric!(ConsumerLoans, "Consumer Loans", field Lnconoth, true,
        "(YTD, $) Other loans to individuals for personal expenditures, including student loans."),
    metric!(AllowanceForCreditLoss, "Allowance for Credit Loss", field Lnatres, true,
        "(YTD, $) Reserve for estimated credit losses on the loan and lease portfolio."),
    metric!(PastDue30To89, "Past Due 30-89 Days", field P3asset, true,
        "(Qtly, $) Loans and leases past due 30-89 days."),
    metric!(PastDue90Plus, "Past Due 90+ Days", field P9asset, true,
        "(Qtly, $) Loans and leases past due 90 days or more."),
    metric!(Tier1Capital, "Tier 1 (Core) Capital", field Rbct1j, true,
        "(Qtly, $) Tier 1 core capital: common equity tier 1 plus additional tier 1 capital."),
    metric!(TotalChargeOffs, "Total Charge-Offs", field Drlnls, true,
        "(YTD, $) Total charge-offs of loans and leases."),
    metric!(TotalRecoveries, "Total Recoveries", field Crlnls, true,
        "(YTD, $) Total recoveries of loans and leases previously charged off."),
    metric!(NetChargeOffsQuarterly, "Total Loans and Leases Net Charge-Offs Quarterly", field Ntlnlsq, true,
        "(Qtly, $) Net charge-offs of loans and leases for the quarter."),
    metric!(NetIncome, "Net Income", field Netinc, true,
        "(YTD, $) Net income earned by the entity."),
    metric!(Cet1BeforeAdjustments, "Common Equity Tier 1 Before Adjustments", field Ct1badj, true,
        "(YTD, $) Common equity tier 1 capital before adjustments."),
    metric!(BankEquityCapital, "Bank Equity Capital", field Eq, true,
        "(YTD, $) Total bank equity capital."),
    metric!(PerpetualPreferredStock, "Perpetual Preferred Stock", field Eqpp, true,
        "(YTD, $) Perpetual preferred stock issued by the bank."),
    metric!(NetInterestMargin, "Net Interest Margin", field Nimy, false,
        "(YTD, %) Net interest income as a percentage of average earning assets."),
    metric!(EarningAssetsToAssets, "Earning Assets / Total Assets", field Ernastr, false,
        "(Qtly, %) Earning assets as a percentage of total assets."),
    metric!(NonperformingToAssets, "Nonperforming Assets / Total Assets", field Nperfv, false,
        "(Qtly, %) Nonperforming assets as a percentage of total assets."),
    metric!(PastDue30To89Ratio, "Assets Past Due 30-89 Days / Total Assets", field P3assetr, false,
        "(Qtly, %) Assets past due 30-89 days as a percentage of total assets."),
    metric!(PastDue90PlusRatio, "Assets Past Due 90+ Days / Total Assets", field P9assetr, false,
        "(Qtly, %) Assets past due 90 days or more as a percentage of total assets."),
    metric!(NetChargeOffRatio, "Net Charge-Offs / Total Loans & Leases", field Ntlnlsr, false,
        "(YTD, %) Net charge-offs as a percentage of total loans and leases."),
    metric!(EarningsCoverage, "Earnings Coverage of Net Loan Charge-Offs", field Iderncvr, false,
        "(X) Number of times earnings cover net loan charge-offs."),
    metric!(ProvisionToChargeOffs, "Loan and Lease Loss Provision to Net Charge-Offs", field Elnantr, false,
        "(YTD, %) Loan loss provision as a percentage of net charge-offs."),
    metric!(AllowanceToLoans, "Loss Allowance / Total Loans & Leases", field Lnatresr, false,
        "(YTD, %) Loss allowance as a percentage of total loans and leases."),
    metric!(AllowanceToNoncurrent, "Loss Allowance to Noncurrent Loans and Leases", field Lnresncr, false,
        "(Qtly, %) Loss allowance as a percentage of noncurrent loans and leases."),
    metric!(NoncurrentLoansRatio, "Noncurrent Loans / Total Loans", field Nclnlsr, false,
        "(Qtly, %) Noncurrent loans as a percentage of total loans."),
    metric!(NetLoansToDeposits, "Net Loans and Leases to Deposits", field Lnlsdepr, false,
        "(YTD, %) Loans and leases net of unearned income and allowance as a percentage of total deposits."),
    metric!(NetLoansToAssets, "Net Loans and Leases to Assets", field Lnlsntv, false,
        "(Qtly, %) Net loans and leases as a percentage of total assets."),
    metric!(ReturnOnAssets, "Return on Assets", field Roa, false,
        "(YTD, %) Annualized net income as a percentage of average assets."),
    metric!(ReturnOnEquity, "Return on Equity", field Roe, false,
        "(YTD, %) Annualized net income as a percentage of average equity."),
    metric!(LeverageRatio, "Leverage (Core Capital) Ratio", field Rbc1aaj, false,
        "(Qtly, %) Tier 1 capital as a percentage of average total assets."),
    metric!(TotalRiskBasedCapitalRatio, "Total Risk-Based Capital Ratio", field Rbcrwaj, false,
        "(Qtly, %) Total risk-based capital as a percentage of risk-weighted assets."),
    metric!(EfficiencyRatio, "Efficiency Ratio", field Eeffr, false,
        "(YTD, %) Noninterest expense as a percentage of net operating revenue."),
    metric!(CeclTransitionAmount, "CECL Transition Amount", derived, true,
        "(YTD, $) CECL transition amount: CET1 before adjustments less bank equity capital plus perpetual preferred stock. Zero before 2019."),
    metric!(RealEstateToCapital, "Real Estate Loans to Tier 1 + ACL", derived, false,
        "(Qtly, %) Real estate loans as a percentage of Tier 1 capital plus allowance for credit loss."),
    metric!(ConstructionToCapital, "RE Construction and Land Development to Tier 1 + ACL", derived, false,
        "(Qtly, %) Construction and land development loans as a percentage of Tier 1 capital plus allowance for credit loss."),
    metric!(CommercialReToCapital, "Commercial RE to Tier 1 + ACL", derived, false,
        "(Qtly, %) Construction, multifamily, nonresidential and CRE not secured by real estate as a percentage of Tier 1 capital plus allowance for credit loss."),
    metric!(NonOwnerOccupiedCreGrowth3y, "Non-Owner Occupied CRE 3-Year Growth Rate", derived, false,
        "(%) Growth over the last 12 reported quarters of construction, multifamily, non-owner-occupied nonresidential and CRE not secured by real estate."),
    metric!(CiToCapital, "C&I Loans to Tier 1 + ACL", derived, false,
        "(Qtly, %) Commercial and industrial loans as a percentage of Tier 1 capital plus allowance for credit loss."),
    metric!(AgricultureToCapital, "Agriculture Loans to Tier 1 + ACL", derived, false,
        "(Qtly, %) Agriculture loans as a percentage of Tier 1 capital plus allowance for credit loss."),
    metric!(CreditCardsToCapital, "Credit Cards to Tier 1 + ACL", derived, false,
        "(Qtly, %) Credit card loans as a percentage of Tier 1 capital plus allowance for credit loss."),
    metric!(NetChargeOffsToAllowance, "Net Charge-Offs / Allowance for Credit Loss", derived, false,
        "(Qtly, %) Quarterly net charge-offs as a percentage of allowance for credit loss."),
];

/// Presentation order: ratios and percentages first, dollar amounts last.
pub const CURATED_ORDER: [Metric; METRIC_COUNT] = {
    use Metric::*;
    [
        RealEstateToCapital,
        ConstructionToCapital,
        CommercialReToCapital,
        NonOwnerOccupiedCreGrowth3y,
        CiToCapital,
        AgricultureToCapital,
        CreditCardsToCapital,
        NetChargeOffsToAllowance,
        NetChargeOffRatio,
        EarningsCoverage,
        ProvisionToChargeOffs,
        AllowanceToLoans,
        AllowanceToNoncurrent,
        NonperformingToAssets,
        PastDue30To89Ratio,
        PastDue90PlusRatio,
        NoncurrentLoansRatio,
        NetLoansToDeposits,
        NetLoansToAssets,
        ReturnOnAssets,
        ReturnOnEquity,
        LeverageRatio,
        TotalRiskBasedCapitalRatio,
        EfficiencyRatio,
        EarningAssetsToAssets,
        NetInterestMargin,
        TotalAssets,
        TotalDeposits,
        TotalLoans,
        NetLoans,
        TotalSecurities,
        RealEstateLoans,
        ResidentialLoans,
        Multifamily,
        FarmlandLoans,
        NonresidentialLoans,
        OwnerOccupiedNonresidential,
        NonOwnerOccupiedNonresidential,
        ConstructionLoans,
        FamilyConstructionLoans,
        OtherConstructionLoans,
        CreNotSecuredByRe,
        CommercialIndustrialLoans,
        AgricultureLoans,
        CreditCards,
        ConsumerLoans,
        AllowanceForCreditLoss,
        PastDue30To89,
        PastDue90Plus,
        Tier1Capital,
        TotalChargeOffs,
        TotalRecoveries,
        NetIncome,
        NetChargeOffsQuarterly,
        Cet1BeforeAdjustments,
        BankEquityCapital,
        CeclTransitionAmount,
        PerpetualPreferredStock,
    ]
};

impl Metric {
    /// Every metric, in catalog order.
    pub fn all() -> impl Iterator<Item = Metric> {
        CATALOG.iter().map(|s| s.metric)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn spec(self) -> &'static MetricSpec {
        &CATALOG[self.index()]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn definition(self) -> &'static str {
        self.spec().definition
    }

    pub fn is_dollar(self) -> bool {
        self.spec().dollar
    }

    pub fn is_derived(self) -> bool {
        matches!(self.spec().source, MetricSource::Derived)
    }

    /// Metric with the given display name.
    pub fn from_name(name: &str) -> Option<Metric> {
        CATALOG.iter().find(|s| s.name == name).map(|s| s.metric)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Base metrics with their source field, in catalog order.
pub fn base_metrics() -> impl Iterator<Item = (Metric, FieldCode)> {
    CATALOG.iter().filter_map(|s| match s.source {
        MetricSource::Field(code) => Some((s.metric, code)),
        MetricSource::Derived => None,
    })
}

/// Display names of dollar-formatted metrics, in presentation order.
pub fn dollar_format_metrics() -> Vec<&'static str> {
    CURATED_ORDER
        .iter()
        .filter(|m| m.is_dollar())
        .map(|m| m.name())
        .collect()
}

/// Display name → definition.
pub fn metric_definitions() -> Vec<(&'static str, &'static str)> {
    CATALOG.iter().map(|s| (s.name, s.definition)).collect()
}
