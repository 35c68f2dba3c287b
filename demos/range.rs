use flatgen::{Gen, Op, Wake};

fn main() {
    let n = 100_000usize;
    let range: Gen<usize> = Gen::new({
        let mut i = 0usize;
        move |_: Wake| {
            if i < n {
                i += 1;
                Ok(Op::Yield(i - 1))
            } else {
                Ok(Op::Complete)
            }
        }
    });

    let sum: usize = range.sum();
    println!("sum = {sum}");
}
