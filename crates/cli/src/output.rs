//! Console tables.

use prettytable::format::consts::FORMAT_NO_LINESEP_WITH_TITLE;
use prettytable::{Table, row};
use range_lp_domain::entities::TradingPair;
use range_lp_domain::math::RangeEstimate;
use range_lp_domain::metrics::{ExitEstimate, ExitInputs};
use range_lp_simulation::backtest::BacktestSummary;
use range_lp_simulation::hourly::HourlyRow;
use range_lp_simulation::monthly::MonthlyReport;
use rust_decimal::Decimal;

pub fn usd(value: Decimal) -> String {
    format!("${:.2}", value.round_dp(2))
}

pub fn pct(value: Decimal) -> String {
    format!("{:.2}%", value.round_dp(2))
}

fn titled(title_left: &str, title_right: &str) -> Table {
    let mut table = Table::new();
    table.set_format(*FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row![title_left, title_right]);
    table
}

pub fn print_range(pair: &TradingPair, estimate: &RangeEstimate) {
    let mut table = titled("Range", &pair.to_string());
    table.add_row(row!["Samples", estimate.samples]);
    table.add_row(row!["Mean", usd(estimate.mean)]);
    table.add_row(row!["Std dev", format!("{:.4}", estimate.std_dev.round_dp(4))]);
    table.add_row(row!["Fallback", estimate.used_fallback]);
    table.add_row(row!["Lower", estimate.range.lower_price]);
    table.add_row(row!["Upper", estimate.range.upper_price]);
    table.printstd();
}

pub fn print_backtest(summary: &BacktestSummary, capital: Decimal) {
    let mut table = titled("Backtest", "");
    table.add_row(row!["Steps", summary.total_steps]);
    table.add_row(row!["Time in position", pct(summary.time_in_position_pct())]);
    table.add_row(row!["Positions opened", summary.positions_opened]);
    table.add_row(row!["Positions closed", summary.positions_closed]);
    table.add_row(row!["Initial capital", usd(capital)]);
    table.add_row(row!["Final equity", usd(summary.final_equity)]);
    table.add_row(row!["Net PnL", usd(summary.net_pnl)]);
    table.add_row(row!["ROI", pct(summary.roi_pct)]);
    table.add_row(row!["Fees earned", usd(summary.total_fees)]);
    table.add_row(row!["Gas paid", usd(summary.total_gas)]);
    table.add_row(row!["Max drawdown", pct(summary.max_drawdown_pct)]);
    table.add_row(row!["HODL value", usd(summary.hodl_value)]);
    table.add_row(row!["vs HODL", usd(summary.vs_hodl)]);
    table.printstd();
}

pub fn print_monthly(report: &MonthlyReport) {
    let mut table = Table::new();
    table.set_format(*FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row![
        "Month",
        "Total Profit ($)",
        "Active Hours",
        "Total Hours",
        "In Range (%)",
        "Optimal Range"
    ]);
    for r in &report.rows {
        table.add_row(row![
            r.month,
            usd(r.profit),
            r.active_hours,
            r.total_hours,
            format!("{:.1}", r.in_range_pct.round_dp(1)),
            r.range
        ]);
    }
    table.printstd();

    println!();
    println!(
        "- Total Profit ({} months): {}",
        report.rows.len(),
        usd(report.total_profit())
    );
    if let Some(best) = report.best_month() {
        println!("- Most Profitable Month: {} ({})", usd(best.profit), best.month);
        println!("- Average Monthly Profit: {}", usd(report.average_profit()));
    }
}

pub fn print_hourly(rows: &[HourlyRow]) {
    let mut table = Table::new();
    table.set_format(*FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row!["Days", "Avg Hourly Profit", "Active Hours", "Low", "High"]);
    for r in rows {
        table.add_row(row![
            r.days,
            format!("${:.4}", r.avg_hourly_profit.round_dp(4)),
            r.active_hours,
            r.low,
            r.high
        ]);
    }
    table.printstd();
}

pub fn print_exit(inputs: &ExitInputs, estimate: &ExitEstimate) {
    let mut table = titled("Exit estimate", "");
    table.add_row(row!["Entry price", inputs.entry_price]);
    table.add_row(row!["Exit price", inputs.exit_price]);
    table.add_row(row!["Quote volume", usd(inputs.quote_volume_usd)]);
    table.add_row(row!["Impermanent loss", pct(estimate.impermanent_loss * Decimal::ONE_HUNDRED)]);
    table.add_row(row!["Estimated fees", usd(estimate.estimated_fees_usd)]);
    table.add_row(row!["Final value", usd(estimate.final_value_usd)]);
    table.add_row(row!["PnL", usd(estimate.pnl_usd)]);
    table.printstd();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_and_percent() {
        assert_eq!(usd(dec!(1234.567)), "$1234.57");
        assert_eq!(usd(dec!(-0.1)), "$-0.10");
        assert_eq!(pct(dec!(12.3)), "12.30%");
    }
}
