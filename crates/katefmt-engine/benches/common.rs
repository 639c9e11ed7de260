// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_cpp_source(functions: usize) -> String {
    let base = "template <typename T, typename Alloc = std::allocator<T>>\nstatic void process(const std::map<int, std::vector<T>>& items, int count, bool verbose)\n{\n    for (int i = 0; i < count; ++i)\n    {\n        if (items.size() > i && verbose) log(\"item\", i, items.at(i).size());\n    }\n}\n\n";
    base.repeat(functions)
}

/// One long call whose arguments span `lines` lines, cursor target inside
#[allow(dead_code)]
pub fn generate_long_call(lines: usize) -> String {
    let mut content = String::from("call(\n");
    for i in 0..lines {
        content.push_str(&format!("    std::pair<int, int>(a{i}, b{i}), (x{i} + y{i}),\n"));
    }
    content.push_str("    last);\n");
    content
}
