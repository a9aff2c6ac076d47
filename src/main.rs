//! group-ledger CLI
//!
//! Balance a group's expenses from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Balances and suggested payments in USD
//! group-ledger balances --input group.json --rates rates.json
//!
//! # Same, in EUR, as JSON
//! group-ledger balances --input group.json --rates rates.json --currency EUR --format json
//!
//! # What bob owes alice
//! group-ledger pair --input group.json --a alice --b bob
//!
//! # Convert an amount
//! group-ledger convert --amount 90 --from EUR --to USD --rates rates.json
//!
//! # Generate a random group for testing
//! group-ledger generate --members 8 --expenses 40 --currencies USD,EUR
//! ```

use group_ledger::core::currency::{format_amount, quote, CurrencyCode, RateTable, SUPPORTED_CURRENCIES};
use group_ledger::core::expense::{ExpenseRecord, GroupRecords, SettlementRecord};
use group_ledger::core::member::MemberId;
use group_ledger::core::split::{compute_shares, SplitRule};
use group_ledger::rates::{CachingRateProvider, InMemoryRateStore, JsonFileRateUpstream, RateProvider};
use group_ledger::settlement::pairwise::balance_between;
use group_ledger::settlement::summary::GroupSummary;
use group_ledger::simulation::stress_test::{generate_random_group, GroupConfig};
use rust_decimal::Decimal;
use std::fs;
use std::process;
use uuid::Uuid;

fn print_usage() {
    eprintln!(
        r#"group-ledger — multi-currency group expense balancing

USAGE:
    group-ledger <COMMAND> [OPTIONS]

COMMANDS:
    balances    Net balance per member and suggested payments
    pair        What one member owes another
    convert     Convert an amount between currencies
    currencies  List supported currencies
    generate    Generate a random group ledger (for testing)
    help        Show this message

OPTIONS (balances, pair):
    --input <FILE>      Path to JSON group file
    --rates <FILE>      Path to JSON rates file ({{"base": "USD", "rates": {{...}}}})
    --currency <CODE>   Settlement currency (default: USD)
    --format <FORMAT>   Output format: text (default) or json  [balances]
    --a <MEMBER>        Member who may be owed                 [pair]
    --b <MEMBER>        Member who may owe                     [pair]

OPTIONS (convert):
    --amount <AMOUNT>   Amount to convert
    --from <CODE>       Source currency
    --to <CODE>         Target currency
    --rates <FILE>      Path to JSON rates file

OPTIONS (generate):
    --members <N>       Number of members (default: 6)
    --expenses <N>      Number of expenses (default: 20)
    --currencies <LIST> Comma-separated currency codes (default: USD)
    --output <FILE>     Write to file instead of stdout

Set RUST_LOG=debug for engine logs."#
    );
}

/// JSON schema for input expenses.
#[derive(serde::Deserialize)]
struct ExpenseInput {
    #[serde(default)]
    id: Option<Uuid>,
    payer: String,
    amount: Decimal,
    #[serde(default = "default_currency")]
    currency: String,
    #[serde(default)]
    shares: Vec<ShareInput>,
    /// Split the amount equally between these members instead of `shares`.
    #[serde(default)]
    split_between: Vec<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(serde::Deserialize)]
struct ShareInput {
    member: String,
    amount: Decimal,
}

#[derive(serde::Deserialize)]
struct SettlementInput {
    payer: String,
    receiver: String,
    amount: Decimal,
    #[serde(default = "default_currency")]
    currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(serde::Deserialize)]
struct GroupFile {
    #[serde(default)]
    expenses: Vec<ExpenseInput>,
    #[serde(default)]
    settlements: Vec<SettlementInput>,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn require_positive(amount: Decimal, what: &str) -> Decimal {
    if amount <= Decimal::ZERO {
        fail(format!("{} amount must be positive, got {}", what, amount));
    }
    amount
}

fn parse_member(id: &str) -> MemberId {
    MemberId::parse(id).unwrap_or_else(|e| fail(e))
}

fn parse_currency(code: &str) -> CurrencyCode {
    code.parse().unwrap_or_else(|e| fail(e))
}

fn load_group(path: &str) -> GroupRecords {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("reading file '{}': {}", path, e)));

    let file: GroupFile = serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "expenses": [
    {{ "payer": "alice", "amount": "90.00", "currency": "EUR", "split_between": ["alice", "bob", "carol"] }},
    {{ "payer": "bob", "amount": "20", "currency": "USD", "shares": [{{ "member": "alice", "amount": "20" }}] }}
  ],
  "settlements": [
    {{ "payer": "carol", "receiver": "alice", "amount": "10", "currency": "USD" }}
  ]
}}"#
        );
        process::exit(1);
    });

    let mut records = GroupRecords::new();
    for input in file.expenses {
        let amount = require_positive(input.amount, "expense");
        let rule = if input.split_between.is_empty() {
            SplitRule::Exact(
                input
                    .shares
                    .into_iter()
                    .map(|s| (parse_member(&s.member), s.amount))
                    .collect(),
            )
        } else {
            SplitRule::Equal(input.split_between.iter().map(|id| parse_member(id)).collect())
        };
        let shares = compute_shares(amount, &rule)
            .unwrap_or_else(|e| fail(format!("expense paid by {}: {}", input.payer, e)));

        let mut expense = ExpenseRecord::with_id(
            input.id.unwrap_or_else(Uuid::new_v4),
            parse_member(&input.payer),
            amount,
            parse_currency(&input.currency),
            shares,
        );
        if let Some(description) = input.description {
            expense = expense.with_description(description);
        }
        records.add_expense(expense);
    }
    for input in file.settlements {
        records.add_settlement(SettlementRecord::new(
            parse_member(&input.payer),
            parse_member(&input.receiver),
            require_positive(input.amount, "settlement"),
            parse_currency(&input.currency),
        ));
    }
    records
}

async fn load_rates(path: Option<&str>) -> RateTable {
    match path {
        Some(path) => {
            let provider =
                CachingRateProvider::new(InMemoryRateStore::new(), JsonFileRateUpstream::new(path));
            let rates = provider.get_rates().await;
            if rates.is_empty() {
                eprintln!("Warning: no exchange rates available from '{}'", path);
            }
            rates
        }
        None => RateTable::default(),
    }
}

/// Pull `--flag value` pairs out of the argument list.
fn parse_options(args: &[String], allowed: &[&str]) -> Vec<(String, String)> {
    let mut options = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if !allowed.contains(&flag) {
            fail(format!("unknown option: {}", flag));
        }
        i += 1;
        let value = args
            .get(i)
            .cloned()
            .unwrap_or_else(|| fail(format!("{} requires a value", flag)));
        options.push((flag.to_string(), value));
        i += 1;
    }
    options
}

fn option<'a>(options: &'a [(String, String)], flag: &str) -> Option<&'a str> {
    options
        .iter()
        .rev()
        .find(|(f, _)| f == flag)
        .map(|(_, v)| v.as_str())
}

fn required<'a>(options: &'a [(String, String)], flag: &str) -> &'a str {
    option(options, flag).unwrap_or_else(|| fail(format!("{} is required", flag)))
}

async fn cmd_balances(args: &[String]) {
    let options = parse_options(args, &["--input", "--rates", "--currency", "--format"]);
    let records = load_group(required(&options, "--input"));
    let rates = load_rates(option(&options, "--rates")).await;
    let currency = parse_currency(option(&options, "--currency").unwrap_or("USD"));

    let summary = GroupSummary::compute(&records.expenses, &records.settlements, &currency, &rates)
        .unwrap_or_else(|e| fail(e));

    match option(&options, "--format").unwrap_or("text") {
        "json" => {
            let json = serde_json::to_string_pretty(&summary).unwrap_or_else(|e| fail(e));
            println!("{}", json);
        }
        "text" => print!("{}", summary),
        other => fail(format!("--format must be 'text' or 'json', got '{}'", other)),
    }
}

async fn cmd_pair(args: &[String]) {
    let options = parse_options(args, &["--input", "--rates", "--currency", "--a", "--b"]);
    let records = load_group(required(&options, "--input"));
    let rates = load_rates(option(&options, "--rates")).await;
    let currency = parse_currency(option(&options, "--currency").unwrap_or("USD"));
    let a = parse_member(required(&options, "--a"));
    let b = parse_member(required(&options, "--b"));

    let owed = balance_between(&records.expenses, &records.settlements, &a, &b, &currency, &rates)
        .unwrap_or_else(|e| fail(e));

    if owed > Decimal::ZERO {
        println!("{} owes {} {}", b, a, format_amount(owed, &currency));
    } else if owed < Decimal::ZERO {
        println!("{} owes {} {}", a, b, format_amount(owed.abs(), &currency));
    } else {
        println!("{} and {} are even", a, b);
    }
}

async fn cmd_convert(args: &[String]) {
    let options = parse_options(args, &["--amount", "--from", "--to", "--rates"]);
    let amount: Decimal = required(&options, "--amount")
        .parse()
        .unwrap_or_else(|e| fail(format!("invalid amount: {}", e)));
    let from = parse_currency(required(&options, "--from"));
    let to = parse_currency(required(&options, "--to"));
    let rates = load_rates(option(&options, "--rates")).await;

    let q = quote(require_positive(amount, "conversion"), &from, &to, &rates)
        .unwrap_or_else(|e| fail(e));
    println!(
        "{} = {}  (rate {})",
        format_amount(q.amount, &q.from),
        format_amount(q.converted, &q.to),
        q.effective_rate().round_dp(6)
    );
}

fn cmd_currencies() {
    for info in SUPPORTED_CURRENCIES.iter() {
        println!("{}  {:<4} {}", info.code, info.symbol, info.name);
    }
}

fn cmd_generate(args: &[String]) {
    let options = parse_options(args, &["--members", "--expenses", "--currencies", "--output"]);
    let parse_count = |flag: &str, default: usize| -> usize {
        option(&options, flag)
            .map(|v| {
                v.parse()
                    .unwrap_or_else(|_| fail(format!("{} requires a number", flag)))
            })
            .unwrap_or(default)
    };

    let defaults = GroupConfig::default();
    let config = GroupConfig {
        member_count: parse_count("--members", defaults.member_count),
        expense_count: parse_count("--expenses", defaults.expense_count),
        currencies: option(&options, "--currencies")
            .map(|list| list.split(',').map(|c| parse_currency(c.trim())).collect())
            .unwrap_or_else(|| defaults.currencies.clone()),
        ..defaults
    };

    let records = generate_random_group(&config);
    let json = serde_json::to_string_pretty(&records).unwrap_or_else(|e| fail(e));

    if let Some(path) = option(&options, "--output") {
        fs::write(path, &json).unwrap_or_else(|e| fail(format!("writing to '{}': {}", path, e)));
        eprintln!(
            "Generated {} expenses and {} settlements across {} members → {}",
            records.expenses.len(),
            records.settlements.len(),
            config.member_count,
            path
        );
    } else {
        println!("{}", json);
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "balances" => cmd_balances(rest).await,
        "pair" => cmd_pair(rest).await,
        "convert" => cmd_convert(rest).await,
        "currencies" => cmd_currencies(),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
