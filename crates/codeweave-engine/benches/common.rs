// Benchmark helper functions - each bench file only uses some of them
#[allow(dead_code)]
pub fn generate_typescript_module(functions: usize) -> String {
    let mut content = String::from("import { helper } from './helper';\n\n");
    for i in 0..functions {
        content.push_str(&format!(
            "export function compute{i}(a: number, b: number): number {{\n  const total = a + b;\n  if (total > {i}) {{\n    return helper(total);\n  }}\n  return total;\n}}\n\n"
        ));
    }
    content
}

/// The module with every function body rewritten, as a reply would stream it
#[allow(dead_code)]
pub fn generate_rewritten_module(functions: usize) -> String {
    let mut content = String::new();
    for i in 0..functions {
        content.push_str(&format!(
            "export function compute{i}(a: number, b: number): number {{\n    const total = a * b;\n    if (total > {i}) {{\n        return helper(total);\n    }}\n    return total;\n}}\n\n"
        ));
    }
    content
}

/// Split `text` into chunks of roughly `size` bytes on char boundaries
#[allow(dead_code)]
pub fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}
