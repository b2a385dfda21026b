use scripts::{report, run, RegressionInput, RunnerError, CONTRACT_NAME};
use tests::{capture_logs, InMemoryToolchain, Stage};

#[tokio::test]
async fn sample_run_prints_coefficients_and_exits_zero() -> anyhow::Result<()> {
    let mut toolchain = InMemoryToolchain::with_contract(CONTRACT_NAME);
    let input = RegressionInput::sample()?;

    let result = run(&mut toolchain, &input).await;
    let mut out = Vec::<u8>::new();
    let status = report(result, &mut out);

    assert_eq!(status, 0);
    assert_eq!(String::from_utf8(out)?, "[0.385224, 65.141571]\n");
    assert_eq!(
        toolchain.calls,
        vec![Stage::FactoryLookup, Stage::Deploy, Stage::Deployed, Stage::Invoke]
    );
    Ok(())
}

#[tokio::test]
async fn target_method_is_called_exactly_once_with_the_sample() -> anyhow::Result<()> {
    let mut toolchain = InMemoryToolchain::with_contract(CONTRACT_NAME);
    let input = RegressionInput::sample()?;

    run(&mut toolchain, &input).await?;

    assert_eq!(toolchain.invocations.len(), 1);
    let (matrix, vector) = &toolchain.invocations[0];
    assert_eq!(matrix, &input.matrix);
    assert_eq!(vector, &vec![99, 65, 79, 75, 87, 81]);
    Ok(())
}

#[tokio::test]
async fn hardcoded_inputs_are_not_modified() -> anyhow::Result<()> {
    let mut toolchain = InMemoryToolchain::with_contract(CONTRACT_NAME);
    let input = RegressionInput::sample()?;
    let before = input.clone();

    run(&mut toolchain, &input).await?;

    assert_eq!(input, before);
    assert_eq!(input, RegressionInput::sample()?);
    Ok(())
}

#[tokio::test]
async fn failure_at_any_stage_exits_one_and_stops() -> anyhow::Result<()> {
    let stages = [
        Stage::FactoryLookup,
        Stage::Deploy,
        Stage::Deployed,
        Stage::Invoke,
    ];
    for (position, stage) in stages.iter().enumerate() {
        let mut toolchain = InMemoryToolchain::with_contract(CONTRACT_NAME).failing_at(*stage);
        let input = RegressionInput::sample()?;

        let result = run(&mut toolchain, &input).await;
        let err = result.as_ref().err().map(ToString::to_string);
        let mut out = Vec::<u8>::new();

        let (status, logs) = capture_logs(|| report(result, &mut out));
        assert_eq!(status, 1, "stage {stage:?}");
        assert!(out.is_empty(), "nothing printed after failing at {stage:?}");

        // the error is logged with its stage and cause
        let err = err.expect("run should fail");
        assert!(logs.contains("ERROR"), "no error line for {stage:?}: {logs}");
        assert!(logs.contains("deployment run failed"), "{logs}");
        assert!(logs.contains(&err), "stage message missing for {stage:?}: {logs}");
        assert!(
            logs.contains(&format!("injected failure at {stage:?}")),
            "cause missing for {stage:?}: {logs}"
        );
        // no later stage was attempted
        assert_eq!(toolchain.calls, stages[..=position].to_vec());
        assert!(toolchain.invocations.is_empty());
    }
    Ok(())
}

#[tokio::test]
async fn unknown_contract_fails_factory_lookup() -> anyhow::Result<()> {
    let mut toolchain = InMemoryToolchain::with_contract("SolMATe_demo");
    let input = RegressionInput::sample()?;

    let err = run(&mut toolchain, &input)
        .await
        .expect_err("factory lookup should fail");

    assert!(matches!(err, RunnerError::FactoryLookup { ref name, .. } if name == CONTRACT_NAME));
    assert_eq!(
        std::error::Error::source(&err).map(ToString::to_string),
        Some(format!("no contract project named `{CONTRACT_NAME}`"))
    );
    assert_eq!(toolchain.calls, vec![Stage::FactoryLookup]);
    Ok(())
}

#[tokio::test]
async fn contract_revert_is_reported_as_invoke_failure() -> anyhow::Result<()> {
    let mut toolchain = InMemoryToolchain::with_contract(CONTRACT_NAME);
    // duplicated rows leave the normal equations singular
    let input = RegressionInput {
        matrix: regression::Matrix::from_rows(&[[2, 1], [2, 1], [2, 1]])?,
        vector: vec![1, 2, 3],
    };

    let err = run(&mut toolchain, &input)
        .await
        .expect_err("singular input should revert");

    assert!(matches!(err, RunnerError::Invoke { ref name, .. } if name == CONTRACT_NAME));
    assert_eq!(report(Err(err), &mut Vec::<u8>::new()), 1);
    Ok(())
}
