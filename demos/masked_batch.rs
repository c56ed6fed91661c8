use ferrite_mce::{Buffer, ExecutionContext, GradientScaler, MultiCrossEntropyLoss};

fn main() -> ferrite_mce::Result<()> {
    // 4 examples × 3 labels; -1 marks a label we have no ground truth for.
    let labels = Buffer::from_vec(4, 3, vec![
        1.0,  0.0, -1.0,
        0.0,  0.0,  1.0,
       -1.0, -1.0, -1.0,
        1.0,  1.0,  0.0,
    ])?;
    let logits = vec![
        2.0, -1.0,  0.3,
       -0.5, -2.0,  1.5,
        0.9,  0.1, -0.7,
        0.2,  3.0, -3.0,
    ];
    let target_weight = vec![1.0, 0.5, 2.0];

    let mut input = Buffer::zeros(4, 3);
    input.copy_from_host(&logits)?;
    let mut loss = Buffer::zeros(1, 1);

    let ctx = ExecutionContext::with_threads(2)?;
    {
        let mut engine = MultiCrossEntropyLoss::new(
            &labels,
            &mut input,
            &mut loss,
            target_weight,
            GradientScaler::X128,
        )?;
        engine.compute(&ctx)?;
    }

    println!("loss = {:.6}", loss.as_slice()[0]);
    for i in 0..input.rows {
        println!("example {i}: labels {:?} -> grads {:.5?}", labels.row(i), input.row(i));
    }
    Ok(())
}
