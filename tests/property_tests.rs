use group_ledger::core::currency::{convert, CurrencyCode, RateTable, SUPPORTED_CURRENCIES};
use group_ledger::core::expense::{ExpenseRecord, SettlementRecord, Share};
use group_ledger::core::member::MemberId;
use group_ledger::settlement::balances::{calculate_balances, Balance};
use group_ledger::settlement::pairwise::balance_between;
use group_ledger::settlement::suggestions::{calculate_optimal_settlements, SETTLED_THRESHOLD};
use group_ledger::simulation::stress_test::split_cents;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

const POOL: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

fn usd() -> CurrencyCode {
    CurrencyCode::new("USD")
}

fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

/// Generate a member from a small pool (so records overlap).
fn arb_member() -> impl Strategy<Value = MemberId> {
    prop::sample::select(POOL.to_vec()).prop_map(MemberId::new)
}

/// Generate a non-empty set of distinct participants.
fn arb_participants() -> impl Strategy<Value = Vec<MemberId>> {
    prop::sample::subsequence(POOL.to_vec(), 1..=POOL.len())
        .prop_map(|ids| ids.into_iter().map(MemberId::new).collect())
}

/// Generate a USD expense split equally in whole cents.
fn arb_cent_expense() -> impl Strategy<Value = ExpenseRecord> {
    (arb_member(), arb_participants(), 1i64..1_000_000).prop_map(
        |(payer, participants, total)| {
            let shares = participants
                .iter()
                .zip(split_cents(total, participants.len()))
                .map(|(member, c)| Share::new(member.clone(), cents(c)))
                .collect();
            ExpenseRecord::new(payer, cents(total), usd(), shares)
        },
    )
}

/// Generate a USD expense whose shares are all whole units.
fn arb_whole_expense() -> impl Strategy<Value = ExpenseRecord> {
    (arb_member(), arb_participants())
        .prop_flat_map(|(payer, participants)| {
            let n = participants.len();
            (
                Just(payer),
                Just(participants),
                prop::collection::vec(1i64..500, n),
            )
        })
        .prop_map(|(payer, participants, units)| {
            let total: i64 = units.iter().sum();
            let shares = participants
                .into_iter()
                .zip(units)
                .map(|(member, u)| Share::new(member, Decimal::from(u)))
                .collect();
            ExpenseRecord::new(payer, Decimal::from(total), usd(), shares)
        })
}

/// Generate a USD settlement between two different members.
fn arb_settlement() -> impl Strategy<Value = SettlementRecord> {
    (arb_member(), arb_member(), 1i64..100_000).prop_filter_map(
        "payer must differ from receiver",
        |(payer, receiver, amount)| {
            if payer == receiver {
                None
            } else {
                Some(SettlementRecord::new(payer, receiver, cents(amount), usd()))
            }
        },
    )
}

/// Generate a rate in [0.5, 2.0] with four decimal places.
fn arb_moderate_rate() -> impl Strategy<Value = Decimal> {
    (5_000i64..=20_000).prop_map(|r| Decimal::new(r, 4))
}

fn arb_currency() -> impl Strategy<Value = CurrencyCode> {
    prop::sample::select(SUPPORTED_CURRENCIES.iter().map(|c| c.code).collect::<Vec<_>>())
        .prop_map(CurrencyCode::new)
}

/// Generate arbitrary balances in cents for distinct members.
fn arb_balances() -> impl Strategy<Value = Vec<Balance>> {
    prop::collection::vec(-100_000i64..100_000, 0..20).prop_map(|amounts| {
        amounts
            .into_iter()
            .enumerate()
            .map(|(i, c)| Balance::new(MemberId::new(format!("M{}", i)), cents(c)))
            .collect()
    })
}

fn as_map(balances: &[Balance]) -> HashMap<MemberId, Decimal> {
    balances
        .iter()
        .map(|b| (b.member.clone(), b.amount))
        .collect()
}

proptest! {
    // ===================================================================
    // INVARIANT 1: Balances are conserved.
    //
    // Every unit a payer is credited is debited from some share holder,
    // and every settlement moves the same amount both ways. In a single
    // currency with cent amounts nothing is rounded, so the sum is exactly
    // zero.
    // ===================================================================
    #[test]
    fn balances_sum_to_zero(
        expenses in prop::collection::vec(arb_cent_expense(), 0..30),
        settlements in prop::collection::vec(arb_settlement(), 0..10),
    ) {
        let balances = calculate_balances(&expenses, &settlements, &usd(), &RateTable::default())
            .unwrap();
        let total: Decimal = balances.iter().map(|b| b.amount).sum();
        prop_assert_eq!(total, Decimal::ZERO);
    }

    // ===================================================================
    // INVARIANT 2: Conversion rounding stays within tolerance.
    //
    // A foreign-currency expense is converted once for the payer and once
    // per share, each rounded to cents. With up to three shares the
    // rounding can never add up to more than 0.02.
    // ===================================================================
    #[test]
    fn foreign_expense_imbalance_is_bounded(
        payer in arb_member(),
        participants in prop::sample::subsequence(POOL.to_vec(), 1..=3),
        total in 1i64..1_000_000,
        rate in arb_moderate_rate(),
    ) {
        let eur = CurrencyCode::new("EUR");
        let mut rates = RateTable::default();
        rates.set_rate(eur.clone(), rate).unwrap();

        let shares = participants
            .iter()
            .zip(split_cents(total, participants.len()))
            .map(|(id, c)| Share::new(MemberId::new(*id), cents(c)))
            .collect();
        let expense = ExpenseRecord::new(payer, cents(total), eur, shares);

        let balances = calculate_balances(&[expense], &[], &usd(), &rates).unwrap();
        let sum: Decimal = balances.iter().map(|b| b.amount).sum();
        prop_assert!(sum.abs() <= dec!(0.02), "imbalance {}", sum);
    }

    // ===================================================================
    // INVARIANT 3: Converting to the same currency is the identity.
    //
    // No rate lookup, no rounding, for any currency and any table.
    // ===================================================================
    #[test]
    fn identity_conversion(
        amount in -10_000_000_000i64..10_000_000_000,
        scale in 0u32..6,
        currency in arb_currency(),
    ) {
        let x = Decimal::new(amount, scale);
        prop_assert_eq!(convert(x, &currency, &currency, &RateTable::default()).unwrap(), x);
    }

    // ===================================================================
    // INVARIANT 4: A round trip loses at most two roundings.
    //
    // Out to another currency and back, each leg rounded to cents. With
    // rates in a realistic band the drift stays within 0.02.
    // ===================================================================
    #[test]
    fn round_trip_conversion_is_bounded(
        amount in 0i64..100_000_000,
        rate in arb_moderate_rate(),
    ) {
        let other = CurrencyCode::new("EUR");
        let mut rates = RateTable::default();
        rates.set_rate(other.clone(), rate).unwrap();

        let x = cents(amount);
        let out = convert(x, &usd(), &other, &rates).unwrap();
        let back = convert(out, &other, &usd(), &rates).unwrap();
        prop_assert!((back - x).abs() <= dec!(0.02), "{} -> {} -> {}", x, out, back);
    }

    // ===================================================================
    // INVARIANT 5: Paying every suggestion settles the group.
    //
    // Record each suggestion as a settlement and recompute: every member
    // ends within 0.02 of zero, and no further payment is suggested.
    // ===================================================================
    #[test]
    fn suggestions_settle_the_group(
        expenses in prop::collection::vec(arb_whole_expense(), 1..25),
    ) {
        let rates = RateTable::default();
        let balances = calculate_balances(&expenses, &[], &usd(), &rates).unwrap();
        let suggestions = calculate_optimal_settlements(&balances);

        let settlements: Vec<SettlementRecord> = suggestions
            .iter()
            .map(|s| SettlementRecord::new(s.from.clone(), s.to.clone(), s.amount, usd()))
            .collect();
        let after = calculate_balances(&expenses, &settlements, &usd(), &rates).unwrap();

        for balance in &after {
            prop_assert!(
                balance.amount.abs() <= dec!(0.02),
                "{} left at {}", balance.member, balance.amount
            );
        }
        prop_assert!(calculate_optimal_settlements(&after).is_empty());
    }

    // ===================================================================
    // INVARIANT 6: Each debtor pays exactly what they owe.
    //
    // Summed per member, suggestions match the starting balance: debtors
    // pay their debt and creditors receive their credit.
    // ===================================================================
    #[test]
    fn suggestions_match_balances_per_member(
        expenses in prop::collection::vec(arb_whole_expense(), 1..25),
    ) {
        let balances = calculate_balances(&expenses, &[], &usd(), &RateTable::default()).unwrap();
        let suggestions = calculate_optimal_settlements(&balances);

        let mut flow: HashMap<MemberId, Decimal> = HashMap::new();
        for s in &suggestions {
            prop_assert!(s.amount > Decimal::ZERO);
            *flow.entry(s.from.clone()).or_default() -= s.amount;
            *flow.entry(s.to.clone()).or_default() += s.amount;
        }

        for (member, amount) in as_map(&balances) {
            let moved = flow.get(&member).copied().unwrap_or_default();
            prop_assert!(
                (moved - amount).abs() <= SETTLED_THRESHOLD,
                "{} balance {} but suggestions move {}", member, amount, moved
            );
        }
    }

    // ===================================================================
    // INVARIANT 7: Suggestions never exceed debtors + creditors - 1.
    //
    // Every payment settles at least one side in full, and the last one
    // settles both.
    // ===================================================================
    #[test]
    fn suggestion_count_is_bounded(balances in arb_balances()) {
        let debtors = balances.iter().filter(|b| b.amount < -SETTLED_THRESHOLD).count();
        let creditors = balances.iter().filter(|b| b.amount > SETTLED_THRESHOLD).count();
        let suggestions = calculate_optimal_settlements(&balances);

        prop_assert!(
            suggestions.len() <= (debtors + creditors).saturating_sub(1),
            "{} suggestions for {} debtors and {} creditors",
            suggestions.len(), debtors, creditors
        );

        let signs = as_map(&balances);
        for s in &suggestions {
            prop_assert!(signs[&s.from] < Decimal::ZERO);
            prop_assert!(signs[&s.to] > Decimal::ZERO);
        }
    }

    // ===================================================================
    // INVARIANT 8: Suggestions are deterministic.
    //
    // The same balances in the same order always give the same payments.
    // ===================================================================
    #[test]
    fn suggestions_are_deterministic(balances in arb_balances()) {
        let first = calculate_optimal_settlements(&balances);
        let second = calculate_optimal_settlements(&balances);
        prop_assert_eq!(first, second);
    }

    // ===================================================================
    // INVARIANT 9: The pairwise query agrees with the aggregator.
    //
    // On a ledger that only involves A and B, what B owes A is A's
    // balance, and the negation of B's.
    // ===================================================================
    #[test]
    fn pairwise_matches_two_member_aggregate(
        expenses in prop::collection::vec(
            (any::<bool>(), 0i64..50_000, 0i64..50_000)
                .prop_filter("expense must be positive", |(_, a, b)| a + b > 0),
            0..15,
        ),
        settlements in prop::collection::vec((any::<bool>(), 1i64..50_000), 0..6),
    ) {
        let (a, b) = (MemberId::new("A"), MemberId::new("B"));

        let expenses: Vec<ExpenseRecord> = expenses
            .into_iter()
            .map(|(a_paid, share_a, share_b)| {
                let payer = if a_paid { a.clone() } else { b.clone() };
                let mut shares = Vec::new();
                if share_a > 0 {
                    shares.push(Share::new(a.clone(), cents(share_a)));
                }
                if share_b > 0 {
                    shares.push(Share::new(b.clone(), cents(share_b)));
                }
                ExpenseRecord::new(payer, cents(share_a + share_b), usd(), shares)
            })
            .collect();
        let settlements: Vec<SettlementRecord> = settlements
            .into_iter()
            .map(|(a_paid, amount)| {
                let (payer, receiver) = if a_paid {
                    (a.clone(), b.clone())
                } else {
                    (b.clone(), a.clone())
                };
                SettlementRecord::new(payer, receiver, cents(amount), usd())
            })
            .collect();

        let rates = RateTable::default();
        let pair = balance_between(&expenses, &settlements, &a, &b, &usd(), &rates).unwrap();
        let balances = as_map(&calculate_balances(&expenses, &settlements, &usd(), &rates).unwrap());

        prop_assert_eq!(balances.get(&a).copied().unwrap_or_default(), pair);
        prop_assert_eq!(balances.get(&b).copied().unwrap_or_default(), -pair);
    }

    // ===================================================================
    // INVARIANT 10: The pairwise query agrees across currencies.
    //
    // Same two-member ledger, recorded in EUR and viewed in USD. The
    // aggregate converts an expense three times (payer, each share) while
    // the pairwise query converts only the other member's share, so the
    // two may drift by at most 0.015 per expense. Settlements convert the
    // same amount on both sides and add no drift.
    // ===================================================================
    #[test]
    fn pairwise_matches_two_member_aggregate_across_currencies(
        expenses in prop::collection::vec(
            (any::<bool>(), 0i64..50_000, 0i64..50_000)
                .prop_filter("expense must be positive", |(_, a, b)| a + b > 0),
            0..15,
        ),
        settlements in prop::collection::vec((any::<bool>(), 1i64..50_000), 0..6),
        rate in arb_moderate_rate(),
    ) {
        let (a, b) = (MemberId::new("A"), MemberId::new("B"));
        let eur = CurrencyCode::new("EUR");
        let mut rates = RateTable::default();
        rates.set_rate(eur.clone(), rate).unwrap();

        let expense_count = expenses.len();
        let expenses: Vec<ExpenseRecord> = expenses
            .into_iter()
            .map(|(a_paid, share_a, share_b)| {
                let payer = if a_paid { a.clone() } else { b.clone() };
                let mut shares = Vec::new();
                if share_a > 0 {
                    shares.push(Share::new(a.clone(), cents(share_a)));
                }
                if share_b > 0 {
                    shares.push(Share::new(b.clone(), cents(share_b)));
                }
                ExpenseRecord::new(payer, cents(share_a + share_b), eur.clone(), shares)
            })
            .collect();
        let settlements: Vec<SettlementRecord> = settlements
            .into_iter()
            .map(|(a_paid, amount)| {
                let (payer, receiver) = if a_paid {
                    (a.clone(), b.clone())
                } else {
                    (b.clone(), a.clone())
                };
                SettlementRecord::new(payer, receiver, cents(amount), eur.clone())
            })
            .collect();

        let pair = balance_between(&expenses, &settlements, &a, &b, &usd(), &rates).unwrap();
        let balances = as_map(&calculate_balances(&expenses, &settlements, &usd(), &rates).unwrap());
        let tolerance = dec!(0.015) * Decimal::from(expense_count) + dec!(0.01);

        let drift_a = balances.get(&a).copied().unwrap_or_default() - pair;
        let drift_b = balances.get(&b).copied().unwrap_or_default() + pair;
        prop_assert!(drift_a.abs() <= tolerance, "A drifts {} from {}", drift_a, pair);
        prop_assert!(drift_b.abs() <= tolerance, "B drifts {} from {}", drift_b, -pair);
    }
}
