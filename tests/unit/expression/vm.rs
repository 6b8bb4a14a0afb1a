use super::*;
use crate::expression::eval::{Binding, evaluate};
use crate::expression::lower::lower_to_bytecode;
use crate::expression::parser::parse_expr;

const FORMULAS: &[&str] = &[
    "5",
    "x+y+frame",
    "(x*y+frame)%255",
    "(y*y+frame)%255",
    "(x*x/(frame+1))%255",
    "x & y | frame ^ 3",
    "x &^ y << 2 >> 1",
    "sin(x * 0.3 + frame) * 127.5 + 127.5",
    "pow(abs(x - 8), 2) + sqrt(y) - exp(-frame) + tan(x / 7) + cos(y)",
    "-x / (y - 3)",
    "+-x % -7",
];

#[test]
fn vm_agrees_with_tree_walker_bit_for_bit() {
    let mut stack = Vec::new();
    for src in FORMULAS {
        let tree = parse_expr(src).unwrap();
        let program = lower_to_bytecode(&tree).unwrap();
        for frame in 0..3 {
            for y in 0..6 {
                for x in 0..9 {
                    let b = Binding::new(x, y, frame);
                    let want = evaluate(&tree, &b).unwrap();
                    let got = eval_program_with_stack(&program, b.values(), &mut stack).unwrap();
                    assert_eq!(
                        got.to_bits(),
                        want.to_bits(),
                        "{src} at x={x} y={y} frame={frame}: vm {got} vs tree {want}"
                    );
                }
            }
        }
    }
}

#[test]
fn stack_is_reused_across_calls() {
    let program = lower_to_bytecode(&parse_expr("x * 2 + y").unwrap()).unwrap();
    let mut stack = Vec::with_capacity(program.max_stack);
    assert_eq!(
        eval_program_with_stack(&program, [1.0, 2.0, 0.0], &mut stack).unwrap(),
        4.0
    );
    assert_eq!(
        eval_program_with_stack(&program, [3.0, 1.0, 0.0], &mut stack).unwrap(),
        7.0
    );
    assert!(stack.is_empty());
    assert_eq!(eval_program(&program, [0.0, 0.0, 0.0]).unwrap(), 0.0);
}

#[test]
fn malformed_programs_fail_cleanly() {
    let mut p = lower_to_bytecode(&parse_expr("x + y").unwrap()).unwrap();
    p.ops.remove(0);
    let err = eval_program(&p, [0.0; 3]).unwrap_err();
    assert!(err.to_string().contains("underflow"), "{err}");

    let mut p = lower_to_bytecode(&parse_expr("x + y").unwrap()).unwrap();
    p.ops.pop();
    let err = eval_program(&p, [0.0; 3]).unwrap_err();
    assert!(err.message.contains("2 values"), "{err}");
}
