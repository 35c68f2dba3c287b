use flatgen::{ElementsOf, Fault, Gen, Op, Routine, Wake};

struct Node {
    value: i32,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

impl Node {
    fn leaf(value: i32) -> Box<Node> {
        Box::new(Node {
            value,
            left: None,
            right: None,
        })
    }

    fn branch(left: Box<Node>, value: i32, right: Box<Node>) -> Box<Node> {
        Box::new(Node {
            value,
            left: Some(left),
            right: Some(right),
        })
    }
}

// In-order walk; delegation flattens the recursion into one sequence.
struct Walk<'t> {
    node: &'t Node,
    pc: u8,
}

impl<'t> Routine<'t, i32> for Walk<'t> {
    fn resume(&mut self, _wake: Wake) -> Result<Op<'t, i32>, Fault> {
        let node = self.node;
        loop {
            self.pc += 1;
            match self.pc {
                1 => {
                    if let Some(left) = node.left.as_deref() {
                        return Ok(Op::Delegate(ElementsOf::nested(Gen::new(Walk {
                            node: left,
                            pc: 0,
                        }))));
                    }
                }
                2 => return Ok(Op::Yield(node.value)),
                3 => {
                    if let Some(right) = node.right.as_deref() {
                        return Ok(Op::Delegate(ElementsOf::nested(Gen::new(Walk {
                            node: right,
                            pc: 0,
                        }))));
                    }
                }
                _ => return Ok(Op::Complete),
            }
        }
    }
}

fn main() {
    let tree = Node::branch(
        Node::branch(Node::leaf(1), 2, Node::leaf(3)),
        4,
        Node::branch(Node::leaf(5), 6, Node::leaf(7)),
    );

    let walk: Gen<i32> = Gen::new(Walk {
        node: &tree,
        pc: 0,
    });
    let values: Vec<i32> = walk.collect();
    println!("in-order: {values:?}");
}
