//! A weekend trip paid for in three currencies.
//!
//! Shows how expenses split different ways turn into balances and a short
//! list of payments, and what one member owes another.

use group_ledger::core::currency::{format_amount, CurrencyCode, RateTable};
use group_ledger::core::expense::{ExpenseRecord, GroupRecords, SettlementRecord};
use group_ledger::core::member::MemberId;
use group_ledger::core::split::{compute_shares, SplitRule};
use group_ledger::settlement::pairwise::balance_between;
use group_ledger::settlement::summary::GroupSummary;
use rust_decimal_macros::dec;

fn main() {
    println!("╔══════════════════════════════════════════╗");
    println!("║  group-ledger: Weekend Trip Example      ║");
    println!("╚══════════════════════════════════════════╝\n");

    let usd = CurrencyCode::new("USD");
    let eur = CurrencyCode::new("EUR");
    let gbp = CurrencyCode::new("GBP");

    let mut rates = RateTable::default();
    rates.set_rate(eur.clone(), dec!(0.92)).unwrap();
    rates.set_rate(gbp.clone(), dec!(0.79)).unwrap();

    let alice = MemberId::new("alice");
    let bob = MemberId::new("bob");
    let carol = MemberId::new("carol");
    let dan = MemberId::new("dan");
    let everyone = vec![alice.clone(), bob.clone(), carol.clone(), dan.clone()];

    let mut records = GroupRecords::new();

    // --- Expenses ---
    println!("━━━ Expenses ━━━\n");

    let cabin = compute_shares(dec!(480), &SplitRule::Equal(everyone.clone())).unwrap();
    records.add_expense(
        ExpenseRecord::new(alice.clone(), dec!(480), eur.clone(), cabin).with_description("Cabin"),
    );

    let groceries = compute_shares(
        dec!(120),
        &SplitRule::Percentage(vec![
            (alice.clone(), dec!(25)),
            (bob.clone(), dec!(25)),
            (carol.clone(), dec!(50)),
        ]),
    )
    .unwrap();
    records.add_expense(
        ExpenseRecord::new(bob.clone(), dec!(120), usd.clone(), groceries)
            .with_description("Groceries"),
    );

    let fuel = compute_shares(
        dec!(60),
        &SplitRule::Exact(vec![(carol.clone(), dec!(20)), (dan.clone(), dec!(40))]),
    )
    .unwrap();
    records.add_expense(
        ExpenseRecord::new(dan.clone(), dec!(60), gbp.clone(), fuel).with_description("Fuel"),
    );

    for expense in &records.expenses {
        println!(
            "  {:<10} paid by {:<6} {:>10}  split {} ways",
            expense.description().unwrap_or("-"),
            expense.payer(),
            format_amount(expense.amount(), expense.currency()),
            expense.shares().len()
        );
    }

    records.add_settlement(SettlementRecord::new(carol.clone(), alice.clone(), dec!(50), eur.clone()));
    println!("\n  carol already paid alice {}\n", format_amount(dec!(50), &eur));

    // --- Balances and suggestions ---
    for currency in [&usd, &eur] {
        let summary =
            GroupSummary::compute(&records.expenses, &records.settlements, currency, &rates)
                .unwrap();
        println!("{}", summary);
    }

    // --- Pairwise ---
    println!("━━━ Between two members ━━━\n");
    for (a, b) in [(&alice, &bob), (&alice, &dan), (&dan, &carol)] {
        let owed =
            balance_between(&records.expenses, &records.settlements, a, b, &usd, &rates).unwrap();
        println!("  {} owes {}: {}", b, a, format_amount(owed, &usd));
    }
}
