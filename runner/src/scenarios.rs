use {
  crate::{
    programs::{NaiveReceiver, SideEntrance},
    settings::{Scenario, Settings},
  },
  anyhow::{bail, ensure, Context},
  defisim_primitives::{
    Action,
    Address,
    Asset,
    Callback,
    CallbackContext,
    FeePolicy,
    Operation,
    OperationState,
    Proposal,
    Role,
    Transaction,
  },
  defisim_vm::{Error, LoanStatus, Simulator},
  tracing::info,
};

/// Replays one scenario on a fresh simulator and checks that it ends
/// the way the scenario describes.
pub fn replay(scenario: Scenario, settings: &Settings) -> anyhow::Result<()> {
  let mut sim = Simulator::new(settings.vm_config());
  info!("replaying {scenario:?} with {:?}", sim.config());
  match scenario {
    Scenario::All => bail!("'all' is not a single scenario"),
    Scenario::ZeroLoan => zero_loan(&mut sim, settings),
    Scenario::NaiveReceiver => naive_receiver(&mut sim, settings),
    Scenario::Truster => truster(&mut sim, settings),
    Scenario::SideEntrance => side_entrance(&mut sim, settings),
    Scenario::Timelock => timelock(&mut sim, settings),
    Scenario::Climber => climber(&mut sim, settings),
  }
}

fn single(origin: Address, operation: Operation) -> Transaction {
  Transaction::new(vec![Action::new(origin, operation)])
}

/// Deploys a token and a pool holding the configured liquidity.
fn funded_pool(
  sim: &mut Simulator,
  settings: &Settings,
  fee: FeePolicy,
  callback_context: CallbackContext,
) -> anyhow::Result<(Asset, Address)> {
  let token = sim.create_token();
  let pool = sim.deploy_pool(token, fee, callback_context);
  sim.mint(&pool, &token, settings.liquidity())?;
  Ok((token, pool))
}

/// A zero unit loan from a pool with a fixed fee succeeds without
/// repayment and its callback runs to completion.
fn zero_loan(sim: &mut Simulator, settings: &Settings) -> anyhow::Result<()> {
  let (token, pool) = funded_pool(
    sim,
    settings,
    FeePolicy::Fixed(1_000),
    CallbackContext::Receiver,
  )?;
  let player = sim.new_account();
  let friend = sim.new_account();

  let receipt = sim.run_transaction(single(player, Operation::FlashLoan {
    pool,
    amount: 0,
    receiver: player,
    callback: Callback::Actions(vec![Action::new(player, Operation::Approve {
      asset: token,
      spender: friend,
      amount: 500,
    })]),
  }))?;

  ensure!(receipt.loans.len() == 1, "expected exactly one loan");
  ensure!(receipt.loans[0].fee == 0, "zero unit loans carry no fee");
  ensure!(receipt.loans[0].status == LoanStatus::Repaid);
  ensure!(sim.query_allowance(&player, &friend, &token) == 500);
  ensure!(sim.query_balance(&pool, &token) == settings.liquidity());
  info!("zero unit loan succeeded with no repayment");
  Ok(())
}

/// Anyone may take loans on behalf of a receiver that pays every fee,
/// so ten loans in one transaction drain it.
fn naive_receiver(
  sim: &mut Simulator,
  settings: &Settings,
) -> anyhow::Result<()> {
  const FEE: u128 = 1_000;
  let (token, pool) = funded_pool(
    sim,
    settings,
    FeePolicy::Fixed(FEE),
    CallbackContext::Receiver,
  )?;
  let victim = sim.deploy_program(NaiveReceiver);
  let player = sim.new_account();
  sim.mint(&victim, &token, 10 * FEE)?;

  let loans = (0..10)
    .map(|_| {
      Action::new(player, Operation::FlashLoan {
        pool,
        amount: 1,
        receiver: victim,
        callback: Callback::Program,
      })
    })
    .collect();
  sim.run_transaction(Transaction::new(loans))?;

  ensure!(sim.query_balance(&victim, &token) == 0, "receiver not drained");
  let expected = settings
    .liquidity()
    .checked_add(10 * FEE)
    .context("pool liquidity plus fees overflows")?;
  ensure!(sim.query_balance(&pool, &token) == expected);
  info!("receiver paid {} in fees it never asked for", 10 * FEE);
  Ok(())
}

/// A pool that runs callbacks in its own context lets the borrower
/// approve itself to spend the pool funds.
fn truster(sim: &mut Simulator, settings: &Settings) -> anyhow::Result<()> {
  let liquidity = settings.liquidity();
  let (token, pool) = funded_pool(
    sim,
    settings,
    FeePolicy::default(),
    CallbackContext::Pool,
  )?;
  let player = sim.new_account();

  sim.run_transaction(Transaction::new(vec![
    Action::new(player, Operation::FlashLoan {
      pool,
      amount: 0,
      receiver: player,
      callback: Callback::Actions(vec![Action::acting_as(
        player,
        pool,
        Operation::Approve {
          asset: token,
          spender: player,
          amount: liquidity,
        },
      )]),
    }),
    Action::new(player, Operation::TransferFrom {
      asset: token,
      owner: pool,
      to: player,
      amount: liquidity,
    }),
  ]))?;

  ensure!(sim.query_balance(&player, &token) == liquidity);
  ensure!(sim.query_balance(&pool, &token) == 0);
  info!("pool drained through an allowance granted in its own context");
  Ok(())
}

/// Repaying a loan with a deposit satisfies the pool, and the deposit
/// can be withdrawn afterwards.
fn side_entrance(
  sim: &mut Simulator,
  settings: &Settings,
) -> anyhow::Result<()> {
  let (token, pool) = funded_pool(
    sim,
    settings,
    FeePolicy::default(),
    CallbackContext::Receiver,
  )?;
  let player = sim.new_account();
  let attacker = sim.deploy_program(SideEntrance { pool, asset: token });

  sim.run_transaction(single(player, Operation::Call {
    target: attacker,
    payload: vec![],
  }))?;

  ensure!(sim.query_balance(&player, &token) == settings.liquidity());
  ensure!(sim.query_balance(&pool, &token) == 0);
  ensure!(sim.query_deposit(&pool, &attacker) == 0);
  info!("pool drained through a deposit counted as repayment");
  Ok(())
}

/// Schedule, wait for the delay, execute exactly once.
fn timelock(sim: &mut Simulator, settings: &Settings) -> anyhow::Result<()> {
  let delay = settings.delay();
  let admin = sim.new_account();
  let proposer = sim.new_account();
  let recipient = sim.new_account();
  let timelock = sim.deploy_timelock(admin, proposer, delay);
  sim.mint(&timelock, &Asset::Native, 10)?;

  let proposal = Proposal {
    target: recipient,
    value: 10,
    payload: vec![],
    salt: [0; 32],
  };
  let id = proposal.id();
  sim.run_transaction(single(proposer, Operation::Schedule {
    timelock,
    proposal: proposal.clone(),
  }))?;

  let execute = single(recipient, Operation::Execute { timelock, proposal });
  if delay.as_secs() != 0 {
    match sim.run_transaction(execute.clone()) {
      Err(Error::TooEarly { .. }) => info!("early execution refused"),
      other => bail!("early execution was not refused: {other:?}"),
    }
  }

  sim.advance_clock(delay);
  sim.run_transaction(execute.clone())?;
  ensure!(
    sim.query_timelock_state(&timelock, &id) == OperationState::Executed
  );
  ensure!(sim.query_balance(&recipient, &Asset::Native) == 10);

  match sim.run_transaction(execute) {
    Err(Error::NotScheduled(_)) => info!("operation {id} executed once"),
    other => bail!("second execution was not refused: {other:?}"),
  }
  Ok(())
}

/// An unscheduled proposal that would schedule itself from its own
/// payload is refused before any of its payload runs.
fn climber(sim: &mut Simulator, settings: &Settings) -> anyhow::Result<()> {
  let delay = settings.delay();
  let admin = sim.new_account();
  let proposer = sim.new_account();
  let attacker = sim.new_account();
  let timelock = sim.deploy_timelock(admin, proposer, delay);
  sim.mint(&timelock, &Asset::Native, 1_000)?;

  let proposal = Proposal {
    target: attacker,
    value: 1_000,
    payload: vec![
      Action::new(timelock, Operation::GrantRole {
        timelock,
        role: Role::Proposer,
        account: attacker,
      }),
      Action::new(timelock, Operation::UpdateDelay { timelock, delay: 0 }),
    ],
    salt: [1; 32],
  };

  match sim.run_transaction(single(attacker, Operation::Execute {
    timelock,
    proposal,
  })) {
    Err(Error::NotScheduled(id)) => {
      info!("unscheduled operation {id} refused")
    }
    other => bail!("unscheduled execution was not refused: {other:?}"),
  }

  ensure!(!sim.has_role(&timelock, Role::Proposer, &attacker));
  ensure!(
    sim.query_delay(&timelock).map(|d| d.as_secs()) == Some(delay.as_secs())
  );
  ensure!(sim.query_balance(&timelock, &Asset::Native) == 1_000);
  Ok(())
}
