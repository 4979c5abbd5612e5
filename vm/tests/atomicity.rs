use {
  common::{
    lending_setup,
    programs::{Forwarder, Reckless, Recursive},
    single,
    LendingSetup,
    POOL_LIQUIDITY,
  },
  defisim_primitives::{
    Action,
    Address,
    Amount,
    Asset,
    Callback,
    CallbackContext,
    FeePolicy,
    Operation,
    Proposal,
    Transaction,
  },
  defisim_vm::{Config, Error, LoanStatus, Simulator},
  rand::{rngs::StdRng, Rng, SeedableRng},
  rmp_serde::to_vec,
  std::time::Duration,
};

mod common;

fn snapshot(
  sim: &Simulator,
  accounts: &[Address],
  pool: &Address,
  asset: &Asset,
) -> Vec<Amount> {
  let mut values = vec![sim.query_balance(pool, asset)];
  for owner in accounts {
    values.push(sim.query_balance(owner, asset));
    values.push(sim.query_deposit(pool, owner));
    for spender in accounts {
      values.push(sim.query_allowance(owner, spender, asset));
    }
  }
  values
}

fn random_action(
  rng: &mut StdRng,
  accounts: &[Address],
  pool: Address,
  asset: Asset,
) -> Action {
  let origin = accounts[rng.gen_range(0..accounts.len())];
  let other = accounts[rng.gen_range(0..accounts.len())];
  let third = accounts[rng.gen_range(0..accounts.len())];
  let amount = rng.gen_range(0..400);
  Action::new(origin, match rng.gen_range(0..8) {
    0 | 1 => Operation::Transfer {
      asset,
      to: other,
      amount,
    },
    2 => Operation::Approve {
      asset,
      spender: other,
      amount,
    },
    3 => Operation::TransferFrom {
      asset,
      owner: other,
      to: third,
      amount,
    },
    4 => Operation::Deposit { pool, amount },
    5 => Operation::Withdraw { pool },
    _ => {
      // borrow up to a bit more than the pool holds, then repay
      // through a deposit, a transfer, both or neither
      let borrowed = rng.gen_range(0..3_000);
      let mut callback = vec![];
      if rng.gen_bool(0.3) {
        callback.push(Action::new(origin, Operation::Deposit {
          pool,
          amount: rng.gen_range(0..400),
        }));
      }
      if rng.gen_bool(0.7) {
        callback.push(Action::new(origin, Operation::Transfer {
          asset,
          to: pool,
          amount: borrowed + rng.gen_range(0..10),
        }));
      }
      Operation::FlashLoan {
        pool,
        amount: borrowed,
        receiver: origin,
        callback: Callback::Actions(callback),
      }
    }
  })
}

#[test]
fn random_transactions_conserve_supply_and_roll_back() -> anyhow::Result<()> {
  let mut rng = StdRng::seed_from_u64(0xdef1);
  let mut sim = Simulator::default();
  let token = sim.create_token();
  let pool =
    sim.deploy_pool(token, FeePolicy::Fixed(5), CallbackContext::Receiver);
  sim.mint(&pool, &token, 2_000)?;
  let accounts: Vec<_> = (0..5).map(|_| sim.new_account()).collect();
  for account in &accounts {
    sim.mint(account, &token, rng.gen_range(0..1_000))?;
  }
  let supply = sim.total_supply(&token);
  assert!(supply.is_some());

  let (mut committed, mut rolled_back, mut loans) = (0, 0, 0);
  for _ in 0..500 {
    let actions = (0..rng.gen_range(1..5))
      .map(|_| random_action(&mut rng, &accounts, pool, token))
      .collect();

    let before = snapshot(&sim, &accounts, &pool, &token);
    match sim.run_transaction(Transaction::new(actions)) {
      Ok(receipt) => {
        assert!(receipt
          .loans
          .iter()
          .all(|loan| loan.status == LoanStatus::Repaid));
        loans += receipt.loans.len();
        committed += 1;
      }
      Err(_) => {
        assert_eq!(snapshot(&sim, &accounts, &pool, &token), before);
        rolled_back += 1;
      }
    }
    assert_eq!(sim.total_supply(&token), supply);
  }

  assert!(committed > 0);
  assert!(rolled_back > 0);
  assert!(loans > 0);
  Ok(())
}

#[test]
fn rejected_credit_leaves_the_sender_untouched() -> anyhow::Result<()> {
  let mut sim = Simulator::default();
  let token = sim.create_token();
  let alice = sim.new_account();
  let bob = sim.new_account();
  let friend = sim.new_account();
  sim.mint(&alice, &token, 10)?;
  sim.mint(&bob, &token, u128::MAX)?;

  let result = sim.run_transaction(Transaction::new(vec![
    common::transfer(alice, token, friend, 3),
    common::transfer(alice, token, bob, 1),
  ]));

  assert_eq!(result.unwrap_err(), Error::BalanceOverflow {
    account: bob,
    asset: token,
    amount: 1,
  });
  assert_eq!(sim.query_balance(&alice, &token), 10);
  assert_eq!(sim.query_balance(&bob, &token), u128::MAX);
  assert_eq!(sim.query_balance(&friend, &token), 0);
  assert_eq!(sim.total_supply(&token), None);
  Ok(())
}

#[test]
fn ignored_nested_loan_failure_still_fails() -> anyhow::Result<()> {
  let LendingSetup {
    mut sim,
    token,
    pool,
    player,
  } = lending_setup(FeePolicy::default(), CallbackContext::Receiver);
  let reckless = sim.deploy_program(Reckless);

  // borrow everything without repaying, then hand it to the player
  let result = sim.run_transaction(single(player, Operation::Call {
    target: reckless,
    payload: to_vec(&vec![
      Operation::FlashLoan {
        pool,
        amount: POOL_LIQUIDITY,
        receiver: reckless,
        callback: Callback::None,
      },
      Operation::Transfer {
        asset: token,
        to: player,
        amount: POOL_LIQUIDITY,
      },
    ])?,
  }));

  assert_eq!(result.unwrap_err(), Error::RepaymentShortfall {
    pool,
    expected: POOL_LIQUIDITY,
    actual: 0,
  });
  assert_eq!(sim.query_balance(&pool, &token), POOL_LIQUIDITY);
  assert_eq!(sim.query_balance(&reckless, &token), 0);
  assert_eq!(sim.query_balance(&player, &token), 0);
  Ok(())
}

#[test]
fn ignored_payload_failure_keeps_operation_scheduled() -> anyhow::Result<()>
{
  let mut sim = Simulator::default();
  let admin = sim.new_account();
  let proposer = sim.new_account();
  let recipient = sim.new_account();
  let delay = Duration::from_secs(60);
  let timelock = sim.deploy_timelock(admin, proposer, delay);
  let reckless = sim.deploy_program(Reckless);
  sim.mint(&timelock, &Asset::Native, 3)?;

  // the value goes out before the payload, which asks for more
  let proposal = Proposal {
    target: recipient,
    value: 3,
    payload: vec![common::transfer(timelock, Asset::Native, recipient, 5)],
    salt: [9; 32],
  };
  let id = proposal.id();
  sim.run_transaction(single(proposer, Operation::Schedule {
    timelock,
    proposal: proposal.clone(),
  }))?;
  sim.advance_clock(delay);

  let result = sim.run_transaction(single(recipient, Operation::Call {
    target: reckless,
    payload: to_vec(&vec![Operation::Execute { timelock, proposal }])?,
  }));

  assert!(matches!(
    result,
    Err(Error::InsufficientBalance { account, .. }) if account == timelock
  ));
  assert!(sim.query_timelock_state(&timelock, &id).is_scheduled());
  assert_eq!(sim.query_balance(&recipient, &Asset::Native), 0);
  assert_eq!(sim.query_balance(&timelock, &Asset::Native), 3);
  Ok(())
}

#[test]
fn unbounded_recursion_overflows_the_stack() -> anyhow::Result<()> {
  let mut sim = Simulator::new(Config { max_call_depth: 8 });
  let player = sim.new_account();
  let friend = sim.new_account();
  let recursive = sim.deploy_program(Recursive);
  sim.mint(&player, &Asset::Native, 10)?;

  let result = sim.run_transaction(Transaction::new(vec![
    common::transfer(player, Asset::Native, friend, 10),
    Action::new(player, Operation::Call {
      target: recursive,
      payload: vec![],
    }),
  ]));

  assert_eq!(result.unwrap_err(), Error::StackOverflow(8));
  assert_eq!(sim.query_balance(&player, &Asset::Native), 10);
  assert_eq!(sim.query_balance(&friend, &Asset::Native), 0);
  Ok(())
}

#[test]
fn programs_act_with_their_own_authority() -> anyhow::Result<()> {
  let mut sim = Simulator::default();
  let player = sim.new_account();
  let forwarder = sim.deploy_program(Forwarder);
  sim.mint(&forwarder, &Asset::Native, 30)?;
  sim.mint(&player, &Asset::Native, 30)?;

  sim.run_transaction(single(player, Operation::Call {
    target: forwarder,
    payload: to_vec(&Operation::Transfer {
      asset: Asset::Native,
      to: player,
      amount: 30,
    })?,
  }))?;
  assert_eq!(sim.query_balance(&player, &Asset::Native), 60);
  assert_eq!(sim.query_balance(&forwarder, &Asset::Native), 0);

  // the caller's balance is out of reach for the program
  let result = sim.run_transaction(single(player, Operation::Call {
    target: forwarder,
    payload: to_vec(&Operation::Transfer {
      asset: Asset::Native,
      to: forwarder,
      amount: 1,
    })?,
  }));
  assert!(matches!(result, Err(Error::InsufficientBalance { account, .. })
    if account == forwarder));

  let garbage = sim.run_transaction(single(player, Operation::Call {
    target: forwarder,
    payload: vec![0xc1],
  }));
  assert!(matches!(garbage, Err(Error::Program { .. })));
  Ok(())
}

#[test]
fn delegated_context_requires_an_origin_on_the_stack() -> anyhow::Result<()>
{
  let LendingSetup {
    mut sim,
    token,
    pool,
    player,
  } = lending_setup(FeePolicy::default(), CallbackContext::Pool);
  let outsider = sim.new_account();

  // the pool frame is on the stack but the outsider never entered it
  let result = sim.run_transaction(single(player, Operation::FlashLoan {
    pool,
    amount: 0,
    receiver: player,
    callback: Callback::Actions(vec![Action::acting_as(
      outsider,
      pool,
      Operation::Transfer {
        asset: token,
        to: outsider,
        amount: 10,
      },
    )]),
  }));
  assert!(matches!(
    result,
    Err(Error::Unauthorized { principal, .. }) if principal == outsider
  ));

  // naming a principal other than the innermost frame fails as well
  let result = sim.run_transaction(single(player, Operation::FlashLoan {
    pool,
    amount: 0,
    receiver: player,
    callback: Callback::Actions(vec![Action::acting_as(
      player,
      outsider,
      Operation::Transfer {
        asset: token,
        to: player,
        amount: 0,
      },
    )]),
  }));
  assert!(matches!(
    result,
    Err(Error::Unauthorized { principal, .. }) if principal == outsider
  ));
  assert_eq!(sim.query_balance(&outsider, &token), 0);
  assert_eq!(sim.query_balance(&pool, &token), POOL_LIQUIDITY);
  Ok(())
}

#[test]
fn explicit_abort_rolls_back() -> anyhow::Result<()> {
  let mut sim = Simulator::default();
  let player = sim.new_account();
  let friend = sim.new_account();
  sim.mint(&player, &Asset::Native, 1)?;

  let result = sim.run_transaction(Transaction::new(vec![
    common::transfer(player, Asset::Native, friend, 1),
    Action::new(player, Operation::Abort {
      reason: "changed my mind".into(),
    }),
  ]));

  assert_eq!(
    result.unwrap_err(),
    Error::Aborted("changed my mind".into())
  );
  assert_eq!(sim.query_balance(&friend, &Asset::Native), 0);

  // the simulator stays usable after a failed transaction
  sim.run_transaction(Transaction::new(vec![common::transfer(
    player,
    Asset::Native,
    friend,
    1,
  )]))?;
  assert_eq!(sim.query_balance(&friend, &Asset::Native), 1);
  Ok(())
}
