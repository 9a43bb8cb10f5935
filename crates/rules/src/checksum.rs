//! Verhoeff 校验
//!
//! 12 位身份号码的最后一位是 Verhoeff 校验位，能检出所有单个数字错误
//! 以及相邻数字交换错误。

/// 身份号码长度
pub const IDENTIFIER_LEN: usize = 12;

/// 乘法表（二面体群 D5）
const MULTIPLICATION: [[u8; 10]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 2, 3, 4, 0, 6, 7, 8, 9, 5],
    [2, 3, 4, 0, 1, 7, 8, 9, 5, 6],
    [3, 4, 0, 1, 2, 8, 9, 5, 6, 7],
    [4, 0, 1, 2, 3, 9, 5, 6, 7, 8],
    [5, 9, 8, 7, 6, 0, 4, 3, 2, 1],
    [6, 5, 9, 8, 7, 1, 0, 4, 3, 2],
    [7, 6, 5, 9, 8, 2, 1, 0, 4, 3],
    [8, 7, 6, 5, 9, 3, 2, 1, 0, 4],
    [9, 8, 7, 6, 5, 4, 3, 2, 1, 0],
];

/// 置换表，按位置模 8 循环使用
const PERMUTATION: [[u8; 10]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 5, 7, 6, 2, 8, 3, 0, 9, 4],
    [5, 8, 0, 3, 7, 9, 6, 1, 4, 2],
    [8, 9, 1, 6, 0, 4, 3, 5, 2, 7],
    [9, 4, 5, 3, 1, 2, 6, 8, 7, 0],
    [4, 2, 8, 6, 5, 7, 3, 9, 0, 1],
    [2, 7, 9, 3, 8, 0, 6, 4, 1, 5],
    [7, 0, 4, 6, 9, 1, 3, 2, 5, 8],
];

/// 校验 12 位身份号码
///
/// 从最低位开始折叠：`x = M[x][P[j % 8][d]]`，最终 `x == 0` 即有效。
/// 长度不是 12 或含非数字字符时返回 `false`。
pub fn validate(identifier: &str) -> bool {
    if identifier.len() != IDENTIFIER_LEN || !identifier.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let check = identifier
        .bytes()
        .rev()
        .enumerate()
        .fold(0u8, |x, (j, b)| {
            let d = (b - b'0') as usize;
            MULTIPLICATION[x as usize][PERMUTATION[j % 8][d] as usize]
        });

    check == 0
}
