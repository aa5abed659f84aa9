macro_rules! all_the_tuples {
    ($name:ident) => {
        $name!([]);
        $name!([D1]);
        $name!([D1, D2]);
        $name!([D1, D2, D3]);
        $name!([D1, D2, D3, D4]);
        $name!([D1, D2, D3, D4, D5]);
        $name!([D1, D2, D3, D4, D5, D6]);
        $name!([D1, D2, D3, D4, D5, D6, D7]);
        $name!([D1, D2, D3, D4, D5, D6, D7, D8]);
        $name!([D1, D2, D3, D4, D5, D6, D7, D8, D9]);
        $name!([D1, D2, D3, D4, D5, D6, D7, D8, D9, D10]);
        $name!([D1, D2, D3, D4, D5, D6, D7, D8, D9, D10, D11]);
        $name!([D1, D2, D3, D4, D5, D6, D7, D8, D9, D10, D11, D12]);
    };
}
